//! Upload widget for file, image and audio custom fields
//!
//! Renders the markup that embeds the upload iframe for a form input, plus a
//! text input for uploading from a URL instead.

pub mod error;
pub mod widget;

pub use error::{Result, UploadError};
pub use widget::{IframeGeometry, UploadEndpoint, UploadRenderer, UploadWidget, DEFAULT_URL_INPUT_SIZE};
