pub mod cloud;
pub mod folders;
pub mod jobs;
pub mod search;
pub mod system;
pub mod videos;
