use mapcanvas::prelude::*;
use std::sync::Arc;

fn context(projection: &str, config: DrawContextConfig) -> DrawContext {
    DrawContext::new(
        config.with_projection(projection),
        Size::new(200, 100),
        Arc::new(NoopPainter),
    )
    .unwrap()
}

fn assert_close(a: Point, b: Point, eps: f64) {
    assert!(
        (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps,
        "{:?} != {:?}",
        a,
        b
    );
}

#[test]
fn test_focus_maps_to_view_center() {
    for definition in ["EPSG:3857", "EPSG:4326", "EPSG:32632", "+proj=eqc +datum=WGS84"] {
        let ctx = context(definition, DrawContextConfig::default());
        let focus = Point::from_degrees(11.5, 48.1);
        let mut surface = RasterSurface::new(200, 100);
        ctx.draw(&mut surface, RedrawFlags::NONE, focus);

        assert_close(ctx.convert_rad_to_px(focus), Point::new(100.0, 50.0), 1e-6);
        assert_close(ctx.convert_px_to_rad(Point::new(100.0, 50.0)), focus, 1e-9);
    }
}

#[test]
fn test_pixel_round_trip() {
    let ctx = context("EPSG:32632", DrawContextConfig::default());
    ctx.zoom(20);
    let mut surface = RasterSurface::new(200, 100);
    ctx.draw(&mut surface, RedrawFlags::NONE, Point::from_degrees(9.0, 50.0));

    for px in [Point::new(0.0, 0.0), Point::new(17.0, 83.0), Point::new(199.0, 99.0)] {
        let rad = ctx.convert_px_to_rad(px);
        assert_close(ctx.convert_rad_to_px(rad), px, 1e-3);
    }

    // north is up
    let top = ctx.convert_px_to_rad(Point::new(100.0, 0.0));
    let bottom = ctx.convert_px_to_rad(Point::new(100.0, 99.0));
    assert!(top.y > bottom.y);
}

#[test]
fn test_corner_refs_cross_antimeridian() {
    let ctx = context("EPSG:3857", DrawContextConfig::default());
    ctx.zoom(30);
    let mut surface = RasterSurface::new(200, 100);
    ctx.draw(&mut surface, RedrawFlags::NONE, Point::from_degrees(179.0, 0.0));

    // 150 px of 10 km each on both sides of the focus
    let half = 1.5e6 / (6_378_137.0 * DEG_TO_RAD);
    let refs = ctx.corner_refs().map(|p| p.to_degrees());
    assert!((refs[0].x - (179.0 - half)).abs() < 1e-6);
    assert!((refs[1].x - (179.0 + half)).abs() < 1e-6);
    assert!((refs[2].x - (179.0 + half)).abs() < 1e-6);
    assert!((refs[3].x - (179.0 - half)).abs() < 1e-6);
    assert!(refs[1].x > 180.0);
}

#[test]
fn test_points_beyond_antimeridian_stay_continuous() {
    let ctx = context("EPSG:3857", DrawContextConfig::default());
    ctx.zoom(30);
    let mut surface = RasterSurface::new(200, 100);
    ctx.draw(&mut surface, RedrawFlags::NONE, Point::from_degrees(179.0, 0.0));

    let px_per_degree = 6_378_137.0 * DEG_TO_RAD / 10_000.0;
    let east = ctx.convert_rad_to_px(Point::from_degrees(181.0, 0.0));
    assert!((east.x - (100.0 + 2.0 * px_per_degree)).abs() < 1e-6);

    // the wrapped twin is on the far side of the world
    let twin = ctx.convert_rad_to_px(Point::from_degrees(-179.0, 0.0));
    assert!((twin.x - (100.0 - 358.0 * px_per_degree)).abs() < 1e-6);

    let mut polygon = [
        Point::from_degrees(178.0, 1.0),
        Point::from_degrees(181.0, 1.0),
        Point::from_degrees(181.0, -1.0),
        Point::from_degrees(178.0, -1.0),
    ];
    ctx.convert_rad_to_px_polygon(&mut polygon);
    assert!((polygon[0].x - (100.0 - px_per_degree)).abs() < 1e-6);
    assert!((polygon[1].x - (100.0 + 2.0 * px_per_degree)).abs() < 1e-6);
    assert!((polygon[1].x - polygon[2].x).abs() < 1e-9);
    assert!(polygon[0].y < polygon[3].y);
}

#[test]
fn test_meter_conversions() {
    let ctx = context("EPSG:32632", DrawContextConfig::default());
    let munich = Point::from_degrees(11.575, 48.137);
    let m = ctx.convert_rad_to_m(munich);
    assert!((m.x - 691_567.33).abs() < 1.0);
    assert!((m.y - 5_334_734.33).abs() < 1.0);
    assert_close(ctx.convert_m_to_rad(m), munich, 1e-8);
}

#[test]
fn test_zoom_rect_picks_most_detailed_fitting_level() {
    let ctx = context("EPSG:3857", DrawContextConfig::default());
    // one degree wide at the equator needs at least 557 m/px on 200 px
    ctx.zoom_rect(&GeoRect::from_degrees(10.0, 0.5, 11.0, 0.0));
    assert_eq!(ctx.zoom_index(), 23);
    assert_eq!(ctx.zoom_factor(), Point::new(700.0, 700.0));
}

#[test]
fn test_zoom_rect_accepts_exact_fit() {
    // a power of two base scale keeps the pixel math exact
    let scale = 1.0 / 1024.0;
    let mut config = DrawContextConfig::default();
    config.base_scale = Point::new(scale, -scale);
    let ctx = context("EPSG:4326", config);

    // exactly 200 x 64 px at zoom factor 1.0
    let rect = GeoRect::new(Point::new(0.0, 0.0), Point::new(200.0 * scale, -64.0 * scale));
    ctx.zoom_rect(&rect);
    assert_eq!(ctx.zoom_index(), 6);
}

#[test]
fn test_zoom_rect_point_uses_point_level() {
    let ctx = context("EPSG:3857", DrawContextConfig::default());
    let p = Point::from_degrees(11.0, 48.0);
    ctx.zoom_rect(&GeoRect::new(p, p));
    assert_eq!(ctx.zoom_index(), 8);

    ctx.set_scales(ScalesType::Square);
    ctx.zoom_rect(&GeoRect::new(p, p));
    assert_eq!(ctx.zoom_index(), 4);
}

#[test]
fn test_zoom_rect_too_large_ends_at_widest() {
    let ctx = context("EPSG:3857", DrawContextConfig::default());
    ctx.zoom_rect(&GeoRect::from_degrees(-170.0, 80.0, 170.0, -80.0));
    assert_eq!(ctx.zoom_index(), ctx.zoom_levels() - 1);
}

#[test]
fn test_projection_switch() {
    let ctx = context("EPSG:3857", DrawContextConfig::default());
    assert!(!ctx.set_projection("+proj=utm +zone=61"));
    assert!(!ctx.is_valid());
    assert_eq!(ctx.get_projection(), "+proj=utm +zone=61");

    let utm = ProjectionBuilder::Utm {
        zone: 33,
        south: false,
        datum: Datum::WGS84,
    };
    assert!(ctx.set_projection(&utm.build()));
    assert!(ctx.is_valid());
    assert_eq!(ProjectionBuilder::detect(&ctx.get_projection()), utm);
}

#[test]
fn test_config_from_json() -> anyhow::Result<()> {
    let config = DrawContextConfig::from_json_str(
        r#"{ "name": "gis", "redraw_mask": 4, "scales": "square", "initial_zoom": 3,
             "projection": "EPSG:3857" }"#,
    )?;
    let ctx = DrawContext::new(config, Size::new(64, 64), Arc::new(NoopPainter))?;
    assert_eq!(ctx.name(), "gis");
    assert_eq!(ctx.redraw_mask(), RedrawFlags::GIS);
    assert_eq!(ctx.scales_type(), ScalesType::Square);
    assert_eq!(ctx.zoom_index(), 3);
    assert!(ctx.is_valid());
    Ok(())
}
