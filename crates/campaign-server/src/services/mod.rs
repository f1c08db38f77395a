//! Business logic services

pub mod campaigns;

pub use campaigns::CampaignService;
