//! Committing rendered markup to the mount element.

use crate::host::{Host, NodeId};

/// Writes a view's output into the mount element.
///
/// The application root only ever hands over complete markup; whether that
/// becomes a full replacement or a patch is up to the renderer.
pub trait Renderer {
    fn commit(&mut self, host: &dyn Host, mount: NodeId, markup: &str);

    /// Remove everything rendered so far.
    fn clear(&mut self, host: &dyn Host, mount: NodeId) {
        self.commit(host, mount, "");
    }
}

/// Replaces the whole mount subtree on every commit.
///
/// Focus, scroll and selection inside the old subtree are lost.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplaceRenderer;

impl Renderer for ReplaceRenderer {
    fn commit(&mut self, host: &dyn Host, mount: NodeId, markup: &str) {
        host.set_content(mount, markup);
        tracing::trace!(target: "markpen::render", %mount, bytes = markup.len(), "replaced mount content");
    }
}
