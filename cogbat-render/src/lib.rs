mod font;
mod scene;
mod text;

pub use font::load_font;
pub use scene::{SceneRenderer, Screen};
pub use text::render_text_pixmap;
