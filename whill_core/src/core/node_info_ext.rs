//! Extension trait for `Option<&mut NodeInfo>` so nodes can log without
//! unwrapping the context first:
//! ```ignore
//! ctx.log_warning("message");
//! ```

use super::NodeInfo;

pub trait NodeInfoExt {
    fn log_debug(&mut self, message: &str);

    fn log_info(&mut self, message: &str);

    fn log_warning(&mut self, message: &str);

    fn log_error(&mut self, message: &str);
}

impl NodeInfoExt for Option<&mut NodeInfo> {
    #[inline]
    fn log_debug(&mut self, message: &str) {
        if let Some(ref mut ctx) = self {
            ctx.log_debug(message);
        }
    }

    #[inline]
    fn log_info(&mut self, message: &str) {
        if let Some(ref mut ctx) = self {
            ctx.log_info(message);
        }
    }

    #[inline]
    fn log_warning(&mut self, message: &str) {
        if let Some(ref mut ctx) = self {
            ctx.log_warning(message);
        }
    }

    #[inline]
    fn log_error(&mut self, message: &str) {
        if let Some(ref mut ctx) = self {
            ctx.log_error(message);
        }
    }
}
