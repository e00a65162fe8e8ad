mod styling;

pub use styling::{dim, red_bold, yellow_bold};
