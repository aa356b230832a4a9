pub mod app;
pub mod fit;
pub mod pacer;
pub mod surface;
pub mod video_label;


pub use app::*;
pub use fit::*;
pub use pacer::*;
pub use surface::*;
pub use video_label::*;
