use crate::foundation::error::{MixError, MixResult};
use crate::foundation::ids::NodeId;
use crate::frame::format::{PixelFormat, VideoFormat};
use crate::graph::node::GraphNode;
use crate::graph::topology::Edge;
use smallvec::SmallVec;

type FormatSet = SmallVec<[PixelFormat; 4]>;

/// Negotiate one [`VideoFormat`] per node.
///
/// For a node with an output this is the format it produces; for the sink it is the format it
/// consumes. No node converts pixel formats, so the whole graph carries one pixel format: the
/// first entry of `preference` that every node accepts. A backward pass propagates sizes towards
/// the sources. A forward pass then lets each source pick from the common candidates and checks
/// that every other node receives one agreed format.
pub(crate) fn negotiate(
    nodes: &[Box<dyn GraphNode>],
    edges: &[Edge],
    order: &[NodeId],
    preference: &[PixelFormat],
) -> MixResult<Vec<VideoFormat>> {
    let n = nodes.len();

    let common: FormatSet = preference
        .iter()
        .copied()
        .filter(|f| nodes.iter().all(|node| node.accepted_formats().contains(f)))
        .collect();
    if common.is_empty() {
        return Err(MixError::format_mismatch(format!(
            "no pixel format in {preference:?} is accepted by every node"
        )));
    }

    let mut size_hint: Vec<Option<(u32, u32)>> = vec![None; n];
    for &id in order.iter().rev() {
        let node = nodes[id.index()].as_ref();
        let mut hint = node.fixed_size();
        for e in edges.iter().filter(|e| e.src == id) {
            if hint.is_none() {
                hint = size_hint[e.dst.index()];
            }
        }
        size_hint[id.index()] = hint;
    }

    let mut out: Vec<Option<VideoFormat>> = vec![None; n];
    for &id in order {
        let node = nodes[id.index()].as_ref();
        let mut incoming: SmallVec<[&Edge; 4]> = edges.iter().filter(|e| e.dst == id).collect();
        incoming.sort_by_key(|e| e.dst_port);

        let negotiated = if incoming.is_empty() {
            let pixel_format = node.negotiate_format(&common)?;
            let (width, height) = size_hint[id.index()].ok_or_else(|| {
                MixError::format_mismatch(format!(
                    "source '{}' has no size and no sized consumer",
                    node.name()
                ))
            })?;
            VideoFormat::new(width, height, pixel_format)?
        } else {
            let upstream: SmallVec<[VideoFormat; 4]> = incoming
                .iter()
                .map(|e| {
                    out[e.src.index()].ok_or_else(|| {
                        MixError::Other(anyhow::anyhow!(
                            "node {} visited before its producer {}",
                            id,
                            e.src
                        ))
                    })
                })
                .collect::<MixResult<_>>()?;

            let pixel_format = upstream[0].pixel_format;
            if let Some(other) = upstream.iter().find(|f| f.pixel_format != pixel_format) {
                return Err(MixError::format_mismatch(format!(
                    "node '{}' receives both {:?} and {:?}",
                    node.name(),
                    pixel_format,
                    other.pixel_format
                )));
            }
            if !node.accepted_formats().contains(&pixel_format) {
                return Err(MixError::format_mismatch(format!(
                    "node '{}' does not accept {pixel_format:?}",
                    node.name()
                )));
            }

            let (width, height) = node
                .fixed_size()
                .unwrap_or((upstream[0].width, upstream[0].height));
            if node.preserves_size()
                && let Some(f) = upstream
                    .iter()
                    .find(|f| (f.width, f.height) != (width, height))
            {
                return Err(MixError::format_mismatch(format!(
                    "node '{}' expects {width}x{height}, receives {}x{}",
                    node.name(),
                    f.width,
                    f.height
                )));
            }
            VideoFormat::new(width, height, pixel_format)?
        };

        tracing::debug!(node = node.name(), format = %negotiated, "negotiated");
        out[id.index()] = Some(negotiated);
    }

    out.into_iter()
        .enumerate()
        .map(|(i, f)| {
            f.ok_or_else(|| MixError::Other(anyhow::anyhow!("node N{i} was never negotiated")))
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/graph/negotiate.rs"]
mod tests;
