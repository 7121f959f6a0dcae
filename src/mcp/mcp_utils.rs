use crate::commands::Out;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, error};

/// The message as text content followed by the structure, if any, as JSON content.
pub(super) fn to_content<T>(out: Out<T>) -> Vec<Content>
where
    T: Debug + Clone + Serialize,
{
    let mut content = vec![Content::text(out.message())];
    if let Some(object) = out.structure() {
        match Content::json(object) {
            Ok(json) => content.push(json),
            Err(e) => error!("Unable to serialize JSON output: {e}"),
        };
    }
    content
}

/// Failures become tool errors rather than protocol errors so that the agent can read them. The
/// error type is attached as JSON so that an agent can tell bad input from a sync failure.
pub(super) fn tool_result<T>(result: crate::Result<Out<T>>) -> Result<CallToolResult, ErrorData>
where
    T: Debug + Clone + Serialize,
{
    Ok(match result {
        Ok(out) => CallToolResult::success(to_content(out)),
        Err(e) => {
            debug!("Tool call failed: {e}");
            let mut content = vec![Content::text(e.to_string())];
            if let Ok(json) = Content::json(serde_json::json!({ "errorType": e.error_type() })) {
                content.push(json);
            }
            CallToolResult::error(content)
        }
    })
}
