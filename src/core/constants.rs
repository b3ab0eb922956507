//! Engine-wide magic numbers for the draw context.
//! Keeping them in a single place makes it easier to tweak them.

/// Extra pixels rendered around the visible view on every side.
pub const BUFFER_BORDER: i32 = 50;

/// Meters per pixel of a 256 px tile at TMS zoom 0 on the Web Mercator
/// sphere, with a small fudge factor so tiles are not scaled by rounding.
pub const MPIXEL: f64 = 156_543.033_928_041 * 1.00025;

/// Zoom index a freshly created context starts with.
pub const DEFAULT_ZOOM_INDEX: usize = 5;

/// Zoom index used for extent-less targets with the default table.
pub const DEFAULT_POINT_ZOOM: usize = 8;

/// Zoom index used for extent-less targets with the square table.
pub const SQUARE_POINT_ZOOM: usize = 4;

/// How long `resize` waits for an in-flight render before giving up.
pub const DEFAULT_RESIZE_WAIT_MS: u64 = 100;
