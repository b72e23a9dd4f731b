pub mod achievements;
pub mod auth;
pub mod email;
pub mod health;
pub mod interview;
pub mod jobs;
pub mod moat;
pub mod outreach;
pub mod profile;
pub mod resume;
pub mod soft_skills;
pub mod swagger;
pub mod wishlist;
