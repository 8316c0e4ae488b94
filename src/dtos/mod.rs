pub mod admindtos;
pub mod campaigndtos;
pub mod deliverabledtos;
pub mod subscriptiondtos;
