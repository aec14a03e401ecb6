pub mod forecast;
pub mod record;
pub mod series;

pub use forecast::*;
pub use record::*;
pub use series::*;
