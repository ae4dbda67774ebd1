pub mod bootcamp;
mod course;
mod review;
mod user;

pub use bootcamp::{Bootcamp, Location};
pub use course::{Course, MinimumSkill};
pub use review::Review;
pub use user::{Role, User};
