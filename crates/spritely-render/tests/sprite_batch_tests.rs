//! SpriteBatch behavior against a mock device.
//!
//! Covers membership, dirty tracking, run partitioning and the commands
//! recorded into the render pass.

use glam::{Mat4, Vec2, Vec3};
use spritely_core::Transform2D;
use spritely_core::geometry::{Rect, Size};
use spritely_render::{
    Camera, Color, OrthographicCamera, Sprite, SpriteBatch, SpriteBatchDescriptor, SpriteHandle,
    SpriteVertex, Texture, TransformHandle, WrapMode,
};
use spritely_test_utils::{MockRenderContext, MockRenderPass, PassCall};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn setup() -> (Arc<MockRenderContext>, SpriteBatch) {
    let ctx = Arc::new(MockRenderContext::new());
    let batch = SpriteBatch::new(ctx.clone(), SpriteBatchDescriptor::default())
        .expect("mock pipeline should compile");
    (ctx, batch)
}

fn texture(ctx: &MockRenderContext, width: u32, height: u32) -> Rc<Texture> {
    let pixels = vec![255u8; (width * height * 4) as usize];
    Rc::new(Texture::from_rgba(ctx, Some("test"), width, height, &pixels).unwrap())
}

fn camera() -> OrthographicCamera {
    OrthographicCamera::new(480.0, 400.0)
}

fn render(batch: &mut SpriteBatch, camera: &dyn Camera) -> MockRenderPass {
    let mut pass = MockRenderPass::new();
    batch.render(&mut pass, camera);
    pass
}

fn assert_runs_cover(batch: &SpriteBatch) {
    let mut expected_start = 0;
    for run in batch.runs() {
        let range = run.vertex_range();
        assert_eq!(range.start, expected_start, "gap or overlap at {:?}", run);
        expected_start = range.end;
    }
    assert_eq!(expected_start as usize, 6 * batch.len());
}

#[test]
fn test_single_textured_sprite_one_draw() {
    let (ctx, mut batch) = setup();
    let tex = texture(&ctx, 32, 32);
    let sprite = Sprite::from_texture(&tex)
        .with_anchor(Vec2::new(0.5, 0.5))
        .into_handle();

    batch.add(&sprite);
    let pass = render(&mut batch, &camera());

    assert_eq!(pass.draws(), vec![0..6]);
    assert_eq!(batch.runs().len(), 1);
    assert_eq!(batch.runs()[0].texture, Some(tex.id()));
    assert_eq!(batch.stats().draw_calls, 1);
}

#[test]
fn test_shared_texture_merges_into_one_draw() {
    let (ctx, mut batch) = setup();
    let tex = texture(&ctx, 16, 16);

    batch.add(&Sprite::from_texture(&tex).into_handle());
    batch.add(&Sprite::from_texture(&tex).into_handle());
    let pass = render(&mut batch, &camera());

    assert_eq!(pass.draws(), vec![0..12]);
}

#[test]
fn test_different_textures_two_draws() {
    let (ctx, mut batch) = setup();
    let a = texture(&ctx, 16, 16);
    let b = texture(&ctx, 16, 16);

    batch.add(&Sprite::from_texture(&a).into_handle());
    batch.add(&Sprite::from_texture(&b).into_handle());
    let pass = render(&mut batch, &camera());

    assert_eq!(pass.draws(), vec![0..6, 6..12]);

    // One texture bind group per run.
    let groups = pass.bind_groups_at(1);
    assert_eq!(groups.len(), 2);
    assert_ne!(groups[0], groups[1]);
}

#[test]
fn test_non_adjacent_same_texture_not_merged() {
    let (ctx, mut batch) = setup();
    let a = texture(&ctx, 8, 8);
    let b = texture(&ctx, 8, 8);

    for tex in [&a, &b, &a] {
        batch.add(&Sprite::from_texture(tex).into_handle());
    }
    let pass = render(&mut batch, &camera());

    assert_eq!(pass.draws(), vec![0..6, 6..12, 12..18]);
    assert!(batch.runs().windows(2).all(|w| w[0].texture != w[1].texture));
    assert_runs_cover(&batch);
}

#[test]
fn test_untextured_sprites_share_white_run() {
    let (ctx, mut batch) = setup();
    let tex = texture(&ctx, 8, 8);

    batch.add(&Sprite::new(Size::new(4.0, 4.0)).into_handle());
    batch.add(&Sprite::new(Size::new(4.0, 4.0)).into_handle());
    batch.add(&Sprite::from_texture(&tex).into_handle());
    let pass = render(&mut batch, &camera());

    assert_eq!(pass.draws(), vec![0..12, 12..18]);
    assert_eq!(batch.runs()[0].texture, None);
}

#[test]
fn test_membership_invariant() {
    let (_ctx, mut batch) = setup();
    let sprites: Vec<SpriteHandle> = (0..5)
        .map(|_| Sprite::new(Size::new(1.0, 1.0)).into_handle())
        .collect();

    for sprite in &sprites {
        batch.add(sprite);
        assert_eq!(batch.vertices().len(), 6 * batch.len());
    }
    batch.add(&sprites[2]);
    assert_eq!(batch.len(), 5);

    batch.remove(&sprites[1]);
    batch.remove(&sprites[1]);
    assert_eq!(batch.len(), 4);
    assert_eq!(batch.vertices().len(), 24);
    assert_eq!(
        batch.vertex_buffer().map(|b| b.size()),
        Some(24 * SpriteVertex::STRIDE)
    );
}

#[test]
fn test_add_and_remove_reallocate_buffer() {
    let (ctx, mut batch) = setup();
    let creates = ctx.count_buffer_creates();
    let sprite = Sprite::new(Size::new(1.0, 1.0)).into_handle();

    batch.add(&sprite);
    batch.add(&Sprite::new(Size::new(1.0, 1.0)).into_handle());
    assert_eq!(ctx.count_buffer_creates(), creates + 2);

    // Removing down to one sprite still allocates; only an empty batch owns none.
    batch.remove(&sprite);
    assert_eq!(ctx.count_buffer_creates(), creates + 3);
}

#[test]
fn test_clean_sprites_not_rebuilt() {
    let (_ctx, mut batch) = setup();
    let a = Sprite::new(Size::new(2.0, 2.0)).into_handle();
    let b = Sprite::new(Size::new(2.0, 2.0)).into_handle();
    batch.add(&a);
    batch.add(&b);

    let cam = camera();
    render(&mut batch, &cam);
    assert_eq!(batch.stats().rebuilt_sprites, 2);

    render(&mut batch, &cam);
    assert_eq!(batch.stats().rebuilt_sprites, 0);

    let before = batch.vertices()[..6].to_vec();
    b.borrow_mut().set_tint(Color::RED);
    render(&mut batch, &cam);

    assert_eq!(batch.stats().rebuilt_sprites, 1);
    assert_eq!(&batch.vertices()[..6], &before[..]);
    assert_eq!(batch.vertices()[6].tint, Color::RED.to_array());
}

#[test]
fn test_whole_buffer_uploaded_each_frame() {
    let (ctx, mut batch) = setup();
    batch.add(&Sprite::new(Size::new(2.0, 2.0)).into_handle());
    batch.add(&Sprite::new(Size::new(2.0, 2.0)).into_handle());

    let cam = camera();
    render(&mut batch, &cam);
    render(&mut batch, &cam);

    let buffer = batch.vertex_buffer().unwrap().clone();
    let writes = ctx.writes_to(&buffer);
    assert_eq!(writes.len(), 2);
    assert_eq!(batch.stats().uploaded_bytes, 2 * 6 * 36);

    let contents = ctx.buffer_contents(&buffer).unwrap();
    assert_eq!(contents, bytemuck::cast_slice::<_, u8>(batch.vertices()));
}

#[test]
fn test_invalidated_transform_triggers_rebuild() {
    let (_ctx, mut batch) = setup();
    let transform: TransformHandle = Rc::new(RefCell::new(Transform2D::default()));
    let sprite = Sprite::new(Size::new(2.0, 2.0))
        .with_transform(&transform)
        .into_handle();
    batch.add(&sprite);

    let cam = camera();
    render(&mut batch, &cam);
    transform.borrow_mut().clear_invalidated();

    render(&mut batch, &cam);
    assert_eq!(batch.stats().rebuilt_sprites, 0);

    transform.borrow_mut().set_position(Vec2::new(10.0, 0.0));
    render(&mut batch, &cam);
    assert_eq!(batch.stats().rebuilt_sprites, 1);

    // Top-left corner of a 2x2 quad, moved right by 10.
    assert_eq!(batch.vertices()[0].position, [9.0, 1.0, 0.0]);
}

#[test]
fn test_vertices_are_in_eye_space() {
    let (_ctx, mut batch) = setup();
    batch.add(&Sprite::new(Size::new(2.0, 2.0)).into_handle());

    let mut cam = camera();
    cam.set_position(Vec2::new(5.0, 5.0));
    render(&mut batch, &cam);

    let expected = cam.view().transform_point3(Vec3::new(-1.0, 1.0, 0.0));
    assert_eq!(batch.vertices()[0].position, expected.to_array());
}

#[test]
fn test_camera_move_rebuilds_everything() {
    let (_ctx, mut batch) = setup();
    batch.add(&Sprite::new(Size::new(2.0, 2.0)).into_handle());
    batch.add(&Sprite::new(Size::new(2.0, 2.0)).into_handle());

    let mut cam = camera();
    render(&mut batch, &cam);
    cam.set_position(Vec2::new(1.0, 0.0));
    render(&mut batch, &cam);

    assert_eq!(batch.stats().rebuilt_sprites, 2);
}

#[test]
fn test_layer_order_and_reorder_rebuild() {
    let (ctx, mut batch) = setup();
    let a = texture(&ctx, 4, 4);
    let b = texture(&ctx, 4, 4);
    let front = Sprite::from_texture(&a).with_layer(1, 0.0).into_handle();
    let back = Sprite::from_texture(&b).with_layer(0, 0.0).into_handle();

    batch.add(&front);
    batch.add(&back);
    let cam = camera();
    render(&mut batch, &cam);

    let order: Vec<_> = batch.runs().iter().map(|r| r.texture).collect();
    assert_eq!(order, vec![Some(b.id()), Some(a.id())]);

    back.borrow_mut().set_layer(2);
    render(&mut batch, &cam);

    let order: Vec<_> = batch.runs().iter().map(|r| r.texture).collect();
    assert_eq!(order, vec![Some(a.id()), Some(b.id())]);
    assert_eq!(batch.stats().rebuilt_sprites, 2);
}

#[test]
fn test_insertion_order_breaks_ties() {
    let (ctx, mut batch) = setup();
    let textures: Vec<_> = (0..3).map(|_| texture(&ctx, 4, 4)).collect();
    for tex in &textures {
        batch.add(&Sprite::from_texture(tex).with_layer(0, 1.0).into_handle());
    }
    render(&mut batch, &camera());

    let order: Vec<_> = batch.runs().iter().map(|r| r.texture).collect();
    let expected: Vec<_> = textures.iter().map(|t| Some(t.id())).collect();
    assert_eq!(order, expected);
}

#[test]
fn test_repeat_tiling_samples_with_repeat() {
    let (ctx, mut batch) = setup();
    let tex = texture(&ctx, 32, 32);
    let sprite = Sprite::from_texture(&tex)
        .with_repeats(true)
        .into_handle();
    sprite.borrow_mut().set_bounds(Size::new(64.0, 64.0));
    sprite.borrow_mut().set_frame(Rect::new(0.0, 0.0, 32.0, 32.0));

    batch.add(&sprite);
    render(&mut batch, &camera());

    assert_eq!(batch.runs()[0].wrap, WrapMode::Repeat);
    // Bottom-right corner is vertex 1 of the first triangle.
    let br = batch.vertices()[1].tex_coord;
    assert!((br[0] - 2.0 * 31.5 / 32.0).abs() < 1e-6);
    assert!((br[1] - 2.0 * 31.5 / 32.0).abs() < 1e-6);
}

#[test]
fn test_shared_texture_with_mixed_wrap_splits_runs() {
    let (ctx, mut batch) = setup();
    let tex = texture(&ctx, 8, 8);
    let tiled = Sprite::from_texture(&tex).with_repeats(true).into_handle();
    tiled.borrow_mut().set_bounds(Size::new(32.0, 32.0));
    let clamped = Sprite::from_texture(&tex).into_handle();

    batch.add(&tiled);
    batch.add(&clamped);
    let pass = render(&mut batch, &camera());

    assert_eq!(pass.draws(), vec![0..6, 6..12]);
    let wraps: Vec<_> = batch.runs().iter().map(|r| r.wrap).collect();
    assert_eq!(wraps, vec![WrapMode::Repeat, WrapMode::ClampToEdge]);
    assert!(batch.runs().iter().all(|r| r.texture == Some(tex.id())));

    let groups = pass.bind_groups_at(1);
    assert_eq!(groups.len(), 2);
    assert_ne!(groups[0], groups[1]);
    assert_runs_cover(&batch);
}

#[test]
fn test_repeats_ignored_without_texture() {
    let (_ctx, mut batch) = setup();
    batch.add(&Sprite::new(Size::new(4.0, 4.0)).with_repeats(true).into_handle());
    batch.add(&Sprite::new(Size::new(4.0, 4.0)).into_handle());
    let pass = render(&mut batch, &camera());

    assert_eq!(pass.draws(), vec![0..12]);
    assert_eq!(batch.runs()[0].wrap, WrapMode::ClampToEdge);
}

#[test]
fn test_sprite_shared_between_batches_rebuilt_by_each() {
    let ctx = Arc::new(MockRenderContext::new());
    let mut first = SpriteBatch::new(ctx.clone(), SpriteBatchDescriptor::default()).unwrap();
    let mut second = SpriteBatch::new(ctx.clone(), SpriteBatchDescriptor::default()).unwrap();
    let sprite = Sprite::new(Size::new(2.0, 2.0)).into_handle();
    first.add(&sprite);
    second.add(&sprite);

    let cam = camera();
    render(&mut first, &cam);
    render(&mut second, &cam);

    sprite.borrow_mut().set_tint(Color::RED);
    render(&mut first, &cam);
    render(&mut second, &cam);

    assert_eq!(first.vertices()[0].tint, Color::RED.to_array());
    assert_eq!(second.vertices()[0].tint, Color::RED.to_array());
    assert_eq!(second.stats().rebuilt_sprites, 1);

    // Both are clean again afterwards.
    render(&mut first, &cam);
    render(&mut second, &cam);
    assert_eq!(first.stats().rebuilt_sprites, 0);
    assert_eq!(second.stats().rebuilt_sprites, 0);
}

#[test]
fn test_dropped_texture_renders_untextured() {
    let (ctx, mut batch) = setup();
    let tex = texture(&ctx, 8, 8);
    let sprite = Sprite::from_texture(&tex).into_handle();
    batch.add(&sprite);

    let cam = camera();
    render(&mut batch, &cam);
    drop(tex);
    let pass = render(&mut batch, &cam);

    assert_eq!(pass.draws(), vec![0..6]);
    assert_eq!(batch.runs()[0].texture, None);
    assert!(sprite.borrow().texture().is_none());
    assert!(batch.vertices()[..6].iter().all(|v| v.tex_coord == [0.0, 0.0]));
}

#[test]
fn test_dropped_transform_falls_back_to_identity() {
    let (_ctx, mut batch) = setup();
    let transform: TransformHandle =
        Rc::new(RefCell::new(Transform2D::from_position(Vec2::new(50.0, 0.0))));
    let sprite = Sprite::new(Size::new(2.0, 2.0))
        .with_transform(&transform)
        .into_handle();
    batch.add(&sprite);

    let cam = camera();
    render(&mut batch, &cam);
    assert_eq!(batch.vertices()[0].position, [49.0, 1.0, 0.0]);

    drop(transform);
    render(&mut batch, &cam);
    assert_eq!(batch.vertices()[0].position, [-1.0, 1.0, 0.0]);
}

#[test]
fn test_pass_commands_are_scoped() {
    let (ctx, mut batch) = setup();
    let tex = texture(&ctx, 8, 8);
    batch.add(&Sprite::from_texture(&tex).into_handle());

    let pass = render(&mut batch, &camera());
    let calls = pass.calls();

    assert_eq!(calls.first(), Some(&PassCall::PushDebugGroup("Sprite Batch".to_string())));
    assert_eq!(calls.last(), Some(&PassCall::PopDebugGroup));
    assert_eq!(pass.debug_group_depth(), 0);
    assert!(matches!(calls[1], PassCall::SetPipeline { .. }));
    assert!(calls.iter().any(|c| matches!(c, PassCall::SetVertexBuffer { slot: 0, .. })));
}

#[test]
fn test_batch_transform_only_changes_uniform() {
    let (ctx, mut batch) = setup();
    batch.add(&Sprite::new(Size::new(2.0, 2.0)).into_handle());

    let cam = camera();
    render(&mut batch, &cam);
    let vertices = batch.vertices().to_vec();

    batch.transform_mut().set_position(Vec2::new(30.0, 0.0));
    render(&mut batch, &cam);

    assert_eq!(batch.vertices(), &vertices[..]);
    assert_eq!(batch.stats().rebuilt_sprites, 0);

    let bytes = ctx.buffer_contents(batch.pipeline().uniform_buffer()).unwrap();
    let cols: [f32; 16] = bytemuck::pod_read_unaligned(&bytes);
    let mvp = Mat4::from_cols_array(&cols);
    let expected = cam.projection() * cam.view() * batch.transform().world() * cam.view().inverse();
    assert!(mvp.abs_diff_eq(expected, 1e-5));
}

#[test]
fn test_reset_recompiles_pipeline() {
    let (ctx, mut batch) = setup();
    batch.add(&Sprite::new(Size::new(1.0, 1.0)).into_handle());
    let shaders = ctx.count_shader_creates();

    batch.reset().unwrap();

    assert_eq!(ctx.count_shader_creates(), shaders + 1);
    assert_eq!(batch.vertices().len(), 6);
    assert!(batch.vertex_buffer().is_some());
}

#[test]
fn test_reset_failure_is_reported() {
    let (ctx, mut batch) = setup();
    ctx.set_validation_error(Some("broken"));

    assert!(batch.reset().is_err());
}

#[test]
fn test_construction_fails_on_invalid_shader() {
    let ctx = Arc::new(MockRenderContext::new());
    ctx.set_validation_error(Some("syntax error"));

    let result = SpriteBatch::new(ctx.clone(), SpriteBatchDescriptor::default());
    assert!(result.is_err());
}
