pub mod campaignmodels;
pub mod deliverablemodels;
pub mod feedbackmodel;
pub mod revenuemodels;
pub mod subscriptionmodels;
pub mod usermodel;
