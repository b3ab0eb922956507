use mapcanvas::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// Paints a graticule every ten degrees into the buffer
fn graticule(target: &mut RenderTarget<'_>) {
    let (width, height) = target.image().dimensions();
    let line = image::Rgba([40, 40, 40, 255]);

    for lon in (-18..=18).map(|i| i as f64 * 10.0) {
        for lat in (-80..=80).map(|i| i as f64) {
            let p = target.rad_to_px(Point::from_degrees(lon, lat));
            if p.is_finite() && p.x >= 0.0 && p.y >= 0.0 {
                let (x, y) = (p.x as u32, p.y as u32);
                if x < width && y < height {
                    target.image().put_pixel(x, y, line);
                }
            }
        }
    }
}

/// Example of driving a draw context without any UI
fn main() -> mapcanvas::Result<()> {
    mapcanvas::init_logging();

    println!("mapcanvas headless example");
    println!("==========================");

    let config = DrawContextConfig::new("map", RedrawFlags::MAP)
        .with_projection(ProjectionBuilder::WorldMercator.build())
        .with_initial_zoom(30);
    let ctx = DrawContext::new(config, Size::new(640, 480), Arc::new(graticule))?;
    let events = ctx.subscribe();
    let mut surface = RasterSurface::new(640, 480);

    println!("Projection: {}", ctx.get_projection());
    println!("Scale: {:?} m/px", ctx.scale());

    let places = [
        ("Munich", Point::from_degrees(11.575, 48.1375)),
        ("Fiji", Point::from_degrees(179.5, -17.7)),
    ];

    for (name, focus) in places {
        ctx.draw(&mut surface, RedrawFlags::MAP, focus);
        if !ctx.wait_idle(Duration::from_secs(5)) {
            return Err(MapError::Render("render did not finish".into()));
        }
        surface.clear();
        ctx.draw(&mut surface, RedrawFlags::NONE, focus);

        let refs = ctx.corner_refs().map(|p| p.to_degrees());
        println!(
            "{}: buffer spans {:.2}..{:.2} lon",
            name, refs[0].x, refs[1].x
        );

        let path = format!("headless-{}.png", name.to_lowercase());
        surface.save_png(&path)?;
        println!("   wrote {}", path);
    }

    for event in events.try_iter() {
        println!("   event {:?}", event);
    }

    Ok(())
}
