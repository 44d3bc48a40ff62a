//! Upload widget markup.
//!
//! The widget is a placeholder `div` whose class carries the iframe metadata
//! read by the admin scripts, followed by a small table with an upload-by-URL
//! input and button.

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, UploadError};

/// URL input width used when none is given.
pub const DEFAULT_URL_INPUT_SIZE: u32 = 20;

const WIDGET_TEMPLATE: &str = r#"<div id='upload_iframe_{{ id }}' class="iframeload { iframe: { id: 'upload_internal_iframe_{{ id }}', src: '{{ src }}', height: {{ height }}, width: {{ width }} } }">
</div>
<table border="0">
	<tr>
		<td style="border-bottom-width: 0px; padding: 0"><label for="upload_url">{{ url_label | escape }}:</label></td>
		<td style="border-bottom-width: 0px; padding-left: 4px;">
			<input id="upload_url_{{ id }}"
				name="upload_url_{{ input_name | escape }}"
				type="text"
				size="{{ url_input_size }}"
				/>
			<input type="button" onclick="uploadurl('{{ id }}','{{ file_type }}')" value="Upload" class="button" style="width:70px"/>
		</td>
	</tr>
</table>
"#;

/// Where the upload iframe is served from and how the URL input is labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEndpoint {
    pub base_uri: String,
    pub endpoint: String,
    pub url_label: String,
}

impl Default for UploadEndpoint {
    fn default() -> Self {
        Self {
            base_uri: String::new(),
            endpoint: "upload.php".to_string(),
            url_label: "Or URL".to_string(),
        }
    }
}

/// One upload widget for a form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadWidget {
    pub input_name: String,
    /// File type passed through to the upload endpoint, e.g. `image` or `audio`.
    pub file_type: String,
    /// Compact layout used on the canvas.
    pub canvas: bool,
    pub url_input_size: Option<u32>,
}

/// Iframe size and the optional `inputSize` query value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IframeGeometry {
    pub width: u32,
    pub height: u32,
    pub input_size: Option<u32>,
}

impl UploadWidget {
    pub fn new(input_name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            input_name: input_name.into(),
            file_type: file_type.into(),
            canvas: false,
            url_input_size: None,
        }
    }

    pub fn canvas(mut self, canvas: bool) -> Self {
        self.canvas = canvas;
        self
    }

    /// Width of the upload-by-URL input. Zero keeps the default width.
    pub fn with_url_input_size(mut self, size: u32) -> Self {
        self.url_input_size = Some(size);
        self
    }

    /// Element id derived from the input name: `[` becomes `_`, `]` is dropped.
    pub fn element_id(&self) -> String {
        self.input_name.replace('[', "_").replace(']', "")
    }

    pub fn geometry(&self) -> IframeGeometry {
        if self.canvas {
            IframeGeometry {
                width: 150,
                height: 60,
                input_size: Some(3),
            }
        } else {
            IframeGeometry {
                width: 380,
                height: 40,
                input_size: None,
            }
        }
    }

    /// Source URL of the upload iframe.
    pub fn iframe_src(&self, endpoint: &UploadEndpoint) -> String {
        let mut src = format!(
            "{}{}?input_name={}&type={}&imageThumbID=img_thumb_{}&canvas={}",
            endpoint.base_uri,
            endpoint.endpoint,
            urlencoding::encode(&self.input_name),
            self.file_type,
            self.element_id(),
            u8::from(self.canvas),
        );
        if let Some(size) = self.geometry().input_size {
            src.push_str(&format!("&inputSize={size}"));
        }
        src
    }
}

#[derive(Serialize)]
struct WidgetContext<'a> {
    id: String,
    src: String,
    width: u32,
    height: u32,
    url_label: &'a str,
    input_name: &'a str,
    url_input_size: u32,
    file_type: &'a str,
}

/// Renders upload widgets against one endpoint.
///
/// ```rust,ignore
/// let renderer = UploadRenderer::new(UploadEndpoint::default())?;
/// let html = renderer.render(&UploadWidget::new("magicfields[photo][1][1]", "image"))?;
/// ```
pub struct UploadRenderer {
    template: liquid::Template,
    endpoint: UploadEndpoint,
}

impl UploadRenderer {
    pub fn new(endpoint: UploadEndpoint) -> Result<Self> {
        let template = liquid::ParserBuilder::with_stdlib()
            .build()
            .and_then(|parser| parser.parse(WIDGET_TEMPLATE))
            .map_err(|e| UploadError::Parse(e.to_string()))?;
        Ok(Self { template, endpoint })
    }

    pub fn endpoint(&self) -> &UploadEndpoint {
        &self.endpoint
    }

    pub fn render(&self, widget: &UploadWidget) -> Result<String> {
        let geometry = widget.geometry();
        let context = WidgetContext {
            id: widget.element_id(),
            src: widget.iframe_src(&self.endpoint),
            width: geometry.width,
            height: geometry.height,
            url_label: &self.endpoint.url_label,
            input_name: &widget.input_name,
            url_input_size: widget
                .url_input_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_URL_INPUT_SIZE),
            file_type: &widget.file_type,
        };
        let globals =
            liquid::to_object(&context).map_err(|e| UploadError::Render(e.to_string()))?;

        debug!(input = %widget.input_name, canvas = widget.canvas, "rendering upload widget");
        self.template
            .render(&globals)
            .map_err(|e| UploadError::Render(e.to_string()))
    }
}
