pub mod backstage;
pub mod oauth;
pub mod servicenow;
