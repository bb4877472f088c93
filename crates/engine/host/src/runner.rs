//! Named-script dispatch through the glue object

use crate::{Document, HostError, Result};
use scripting::{EngineNamespace, GlueHandle};

/// Entry point the glue object must expose
pub const RUN_SCRIPT_METHOD: &str = "runScript";

/// Optional glue hook called with the title of each newly opened document
pub const NEW_DOCUMENT_HOOK: &str = "onNewDocument";

/// Call `glue.runScript(name)`.
///
/// Without a glue object the request is refused rather than attempted.
pub fn dispatch_script(
    namespace: &EngineNamespace,
    glue: Option<&GlueHandle>,
    name: &str,
) -> Result<()> {
    let glue = glue.ok_or(HostError::DispatchUnavailable)?;
    namespace.call_method(glue, RUN_SCRIPT_METHOD, name)?;
    Ok(())
}

/// Call `glue.onNewDocument(title)` when the glue defines it.
///
/// No glue, or a glue without the hook, is not an error.
pub fn notify_new_document(
    namespace: &EngineNamespace,
    glue: Option<&GlueHandle>,
    doc: &dyn Document,
) -> Result<()> {
    match glue {
        Some(glue) if glue.has_function(NEW_DOCUMENT_HOOK) => {
            namespace.call_method(glue, NEW_DOCUMENT_HOOK, &doc.title())?;
            Ok(())
        }
        _ => Ok(()),
    }
}
