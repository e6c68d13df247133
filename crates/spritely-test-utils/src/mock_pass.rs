//! Mock render pass that records commands for inspection.

use crate::{gpu_types::*, render_pass::RenderPassEncoder};
use std::ops::Range;

/// A command recorded by [`MockRenderPass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassCall {
    SetPipeline { pipeline_id: Option<usize> },
    SetBindGroup { index: u32, bind_group_id: Option<usize> },
    SetVertexBuffer { slot: u32, buffer_id: Option<usize> },
    Draw { vertices: Range<u32>, instances: Range<u32> },
    PushDebugGroup(String),
    PopDebugGroup,
}

/// Records render pass commands instead of encoding them.
#[derive(Debug, Default)]
pub struct MockRenderPass {
    calls: Vec<PassCall>,
}

impl MockRenderPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[PassCall] {
        &self.calls
    }

    /// Vertex ranges of every draw, in order.
    pub fn draws(&self) -> Vec<Range<u32>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                PassCall::Draw { vertices, .. } => Some(vertices.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count_draws(&self) -> usize {
        self.draws().len()
    }

    /// Bind group ids set at `index`, in order.
    pub fn bind_groups_at(&self, index: u32) -> Vec<Option<usize>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                PassCall::SetBindGroup {
                    index: i,
                    bind_group_id,
                } if *i == index => Some(*bind_group_id),
                _ => None,
            })
            .collect()
    }

    /// Pushes minus pops. Zero when every debug group was closed.
    pub fn debug_group_depth(&self) -> isize {
        self.calls.iter().fold(0, |depth, call| match call {
            PassCall::PushDebugGroup(_) => depth + 1,
            PassCall::PopDebugGroup => depth - 1,
            _ => depth,
        })
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderPassEncoder for MockRenderPass {
    fn set_pipeline(&mut self, pipeline: &GpuRenderPipeline) {
        self.calls.push(PassCall::SetPipeline {
            pipeline_id: pipeline.mock_id(),
        });
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &GpuBindGroup) {
        self.calls.push(PassCall::SetBindGroup {
            index,
            bind_group_id: bind_group.mock_id(),
        });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer) {
        self.calls.push(PassCall::SetVertexBuffer {
            slot,
            buffer_id: buffer.mock_id(),
        });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.calls.push(PassCall::Draw {
            vertices,
            instances,
        });
    }

    fn push_debug_group(&mut self, label: &str) {
        self.calls.push(PassCall::PushDebugGroup(label.to_string()));
    }

    fn pop_debug_group(&mut self) {
        self.calls.push(PassCall::PopDebugGroup);
    }
}
