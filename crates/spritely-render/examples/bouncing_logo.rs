//! A single logo sprite bouncing around a 480x400 offscreen target.
//!
//! Renders a few seconds of simulated frames headlessly and logs what the
//! batch did each frame. Run with `RUST_LOG=trace` to see per-frame output.

use glam::Vec2;
use spritely_core::config::{BenchmarkMode, Config};
use spritely_core::geometry::Size;
use spritely_core::{Transform2D, profiling};
use spritely_render::{
    GraphicsContext, GraphicsError, OrthographicCamera, Sprite, SpriteBatch,
    SpriteBatchDescriptor, Texture, TransformHandle,
};
use std::cell::RefCell;
use std::rc::Rc;

const WIDTH: u32 = 480;
const HEIGHT: u32 = 400;
const LOGO_SIZE: u32 = 64;
const FRAMES: u32 = 240;
const FRAME_TIME: f32 = 1.0 / 60.0;

/// Moves a transform at constant speed, reflecting off the viewport edges.
struct Bounce {
    velocity: Vec2,
    half_extent: Vec2,
}

impl Bounce {
    fn update(&mut self, transform: &mut Transform2D, dt: f32) {
        let mut position = transform.position() + self.velocity * dt;

        for axis in 0..2 {
            if position[axis].abs() > self.half_extent[axis] {
                position[axis] = position[axis].clamp(-self.half_extent[axis], self.half_extent[axis]);
                self.velocity[axis] = -self.velocity[axis];
            }
        }

        transform.set_position(position);
    }
}

/// A ring on a transparent background.
fn logo_pixels(size: u32) -> Vec<u8> {
    let center = size as f32 / 2.0;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);

    for y in 0..size {
        for x in 0..size {
            let d = Vec2::new(x as f32 + 0.5 - center, y as f32 + 0.5 - center).length();
            let on_ring = d > center * 0.55 && d < center * 0.95;
            let shade = (255.0 * y as f32 / size as f32) as u8;
            pixels.extend_from_slice(&if on_ring {
                [255, shade, 64, 255]
            } else {
                [0, 0, 0, 0]
            });
        }
    }

    pixels
}

fn create_target(ctx: &GraphicsContext, format: wgpu::TextureFormat) -> wgpu::TextureView {
    ctx.device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Bouncing Logo Target"),
            size: wgpu::Extent3d {
                width: WIDTH,
                height: HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn main() -> Result<(), GraphicsError> {
    spritely_core::init(&Config {
        log_filter: None,
        benchmark: BenchmarkMode::Off,
    });

    let ctx = GraphicsContext::new_owned_sync()?;
    tracing::info!("Rendering on {}", ctx.info().name);

    let descriptor = SpriteBatchDescriptor {
        label: "Logo Batch".to_string(),
        ..Default::default()
    };
    let target = create_target(&ctx, descriptor.target_format);
    let mut batch = SpriteBatch::new(ctx.clone(), descriptor)?;

    let logo = Rc::new(Texture::from_rgba(
        &*ctx,
        Some("Logo"),
        LOGO_SIZE,
        LOGO_SIZE,
        &logo_pixels(LOGO_SIZE),
    )?);
    let transform: TransformHandle = Rc::new(RefCell::new(Transform2D::default()));
    let sprite = Sprite::from_texture(&logo)
        .with_transform(&transform)
        .into_handle();
    batch.add(&sprite);

    let mut bounce = Bounce {
        velocity: Vec2::new(150.0, 110.0),
        half_extent: (Size::new(WIDTH as f32, HEIGHT as f32).to_vec2()
            - Size::new(LOGO_SIZE as f32, LOGO_SIZE as f32).to_vec2())
            * 0.5,
    };
    let camera = OrthographicCamera::new(WIDTH as f32, HEIGHT as f32);

    for frame in 0..FRAMES {
        profiling::new_frame();
        bounce.update(&mut transform.borrow_mut(), FRAME_TIME);

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Bouncing Logo Frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Bouncing Logo Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.12,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            batch.render(&mut pass, &camera);
        }
        ctx.queue.submit(Some(encoder.finish()));

        // The batch has consumed this frame's movement.
        transform.borrow_mut().clear_invalidated();

        if frame % 60 == 0 {
            let stats = batch.stats();
            tracing::info!(
                frame,
                position = ?transform.borrow().position(),
                rebuilt = stats.rebuilt_sprites,
                draws = stats.draw_calls,
                "logo frame"
            );
        }
    }

    tracing::info!("Rendered {} frames", FRAMES);
    Ok(())
}
