//! Base pass stencil writes confining the overlay pass

use super::*;

const BEHIND_FLAG: Vec3 = Vec3::new(1.0, 0.0, -1.0);

fn flag_only(fixture: &mut Fixture) -> Scene {
    let material = Rc::clone(&fixture.flag_material);
    let flag = fixture.quad_model(&material);
    let mut scene = Scene::new();
    scene.add_node(SceneNode::camera("camera", camera()));
    scene.add_node(SceneNode::model("flag", flag, Transform::identity()));
    scene
}

fn mario_only(fixture: &mut Fixture) -> Scene {
    let material = Rc::clone(&fixture.mario_material);
    let mario = fixture.quad_model(&material);
    let mut scene = Scene::new();
    scene.add_node(SceneNode::camera("camera", camera()));
    scene.add_node(SceneNode::model("mario", mario, Transform::from_translation(BEHIND_FLAG)));
    scene
}

#[test]
fn test_overlay_only_where_character_is_behind_flag() {
    let mut fixture = Fixture::new();

    let scene = flag_only(&mut fixture);
    fixture.render(&scene);
    let flag_pixels = pixels_with_color(fixture.device(), RED);

    let scene = mario_only(&mut fixture);
    fixture.render(&scene);
    let mario_pixels = pixels_with_color(fixture.device(), GREEN);

    let scene = fixture.flag_and_mario_scene(BEHIND_FLAG);
    fixture.render(&scene);
    let device = fixture.device();
    let overlay = pixels_with_color(device, BLUE);
    let visible_mario = pixels_with_color(device, GREEN);
    let visible_flag = pixels_with_color(device, RED);

    let expected_overlay: BTreeSet<_> = flag_pixels.intersection(&mario_pixels).copied().collect();
    assert_eq!(overlay.len(), 12);
    assert!(overlay.contains(&(9, 7)));
    assert_eq!(overlay, expected_overlay);
    assert_eq!(visible_mario, mario_pixels.difference(&flag_pixels).copied().collect::<BTreeSet<_>>());
    assert_eq!(visible_flag, flag_pixels.difference(&mario_pixels).copied().collect::<BTreeSet<_>>());
    assert!(!visible_mario.is_empty());

    for &(x, y) in &overlay {
        assert_eq!(device.stencil_at(x, y), 1);
    }
    for &(x, y) in &visible_mario {
        assert_eq!(device.stencil_at(x, y), 0);
    }
    assert_eq!(device.stencil_at(0, 0), 0);
}

#[test]
fn test_overlay_rejected_at_equal_depth() {
    let mut fixture = Fixture::new();

    let scene = flag_only(&mut fixture);
    fixture.render(&scene);
    let flag_pixels = pixels_with_color(fixture.device(), RED);

    let scene = fixture.flag_and_mario_scene(Vec3::zeros());
    fixture.render(&scene);

    assert!(pixels_with_color(fixture.device(), BLUE).is_empty());
    assert_eq!(pixels_with_color(fixture.device(), RED), flag_pixels);
}

#[test]
fn test_overlay_filter_selects_source_drawcalls() {
    let mut matching = Fixture::with_overlay_filter(|base, _| OverlayFilter::SourceProgram(base.id()));
    let scene = matching.flag_and_mario_scene(BEHIND_FLAG);
    matching.render(&scene);
    assert_eq!(pixels_with_color(matching.device(), BLUE).len(), 12);

    let mut by_name = Fixture::with_overlay_filter(|_, _| OverlayFilter::SourceMaterial("mario pbr".to_string()));
    let scene = by_name.flag_and_mario_scene(BEHIND_FLAG);
    by_name.render(&scene);
    assert_eq!(pixels_with_color(by_name.device(), BLUE).len(), 12);

    let mut other = Fixture::with_overlay_filter(|_, overlay| OverlayFilter::SourceProgram(overlay.id()));
    let scene = other.flag_and_mario_scene(BEHIND_FLAG);
    let stats = other.render(&scene);
    assert!(pixels_with_color(other.device(), BLUE).is_empty());
    assert_eq!(stats.drawcalls, 2);
}

#[test]
fn test_default_overlay_skips_other_drawcalls_in_bucket() {
    let mut fixture = Fixture::new();
    let (flag_material, mario_material) = (Rc::clone(&fixture.flag_material), Rc::clone(&fixture.mario_material));
    let flag = fixture.quad_model(&flag_material);
    let mario = fixture.quad_model(&mario_material);
    let flag_vertices = flag.vertex_array();

    let mut scene = Scene::new();
    scene.add_node(SceneNode::camera("camera", camera()));
    scene.add_node(SceneNode::model("flag", flag, Transform::identity()).with_buckets(vec![0, 1]));
    scene.add_node(
        SceneNode::model("mario", mario, Transform::from_translation(BEHIND_FLAG)).with_buckets(vec![0, 1]),
    );
    let stats = fixture.render(&scene);

    assert_eq!(fixture.renderer.buckets().get(1).len(), 2);
    assert_eq!(stats.drawcalls, 3);
    assert_eq!(stats.draws, 3);
    assert_eq!(pixels_with_color(fixture.device(), BLUE).len(), 12);

    let overlay_draws: Vec<_> = fixture
        .device()
        .commands()
        .iter()
        .filter_map(|command| match command {
            crate::render::device::DeviceCommand::Draw { state, .. } if state.program == Some(fixture.dither.id()) => {
                Some(state.vertex_array)
            }
            _ => None,
        })
        .collect();
    assert_eq!(overlay_draws.len(), 1);
    assert_ne!(overlay_draws[0], Some(flag_vertices));
}
