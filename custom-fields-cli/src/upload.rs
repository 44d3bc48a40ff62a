//! Upload widget command.

use anyhow::Result;
use serde_json::json;

use custom_fields::UploadConfig;
use custom_fields_upload::{UploadEndpoint, UploadRenderer, UploadWidget};

use crate::context::CommandContext;

pub fn endpoint_from_config(config: &UploadConfig) -> UploadEndpoint {
    UploadEndpoint {
        base_uri: config.base_uri.clone(),
        endpoint: config.endpoint.clone(),
        url_label: config.url_label.clone(),
    }
}

pub fn run_upload_widget(
    ctx: &CommandContext,
    input_name: &str,
    file_type: &str,
    canvas: bool,
    size: Option<u32>,
) -> Result<()> {
    let renderer = UploadRenderer::new(endpoint_from_config(&ctx.config.upload))?;
    let mut widget = UploadWidget::new(input_name, file_type).canvas(canvas);
    widget.url_input_size = size;
    let html = renderer.render(&widget)?;

    if ctx.json {
        return ctx.print_json(&json!({
            "id": widget.element_id(),
            "src": widget.iframe_src(renderer.endpoint()),
            "html": html,
        }));
    }
    print!("{html}");
    Ok(())
}
