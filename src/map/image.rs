use super::{MapView, RouteColor};
use crate::Result;
use staticmap::{
    tools::{CircleBuilder, Color, LineBuilder},
    StaticMapBuilder,
};

pub const PREVIEW_WIDTH: u32 = 800;
pub const PREVIEW_HEIGHT: u32 = 500;

/// Renders the view on top of OSM tiles. Tile fetching blocks, so this runs
/// on the blocking pool.
pub async fn preview_png(view: MapView) -> Result<Vec<u8>> {
    let res = actix_web::web::block(move || render(&view, PREVIEW_WIDTH, PREVIEW_HEIGHT)).await??;
    Ok(res)
}

pub fn render(view: &MapView, width: u32, height: u32) -> Result<Vec<u8>> {
    let builder = StaticMapBuilder::default()
        .width(width)
        .height(height)
        .padding((20, 20));
    let builder = match fixed_viewport(view) {
        Some(Viewport { zoom, lat, lon }) => builder.zoom(zoom).lat_center(lat).lon_center(lon),
        None => builder,
    };
    let mut map = builder.build()?;
    for route in &view.routes {
        let line = LineBuilder::new()
            .lat_coordinates(route.line.points().map(|it| it.y()).collect::<Vec<f64>>())
            .lon_coordinates(route.line.points().map(|it| it.x()).collect::<Vec<f64>>())
            .width(3.)
            .simplify(true)
            .color(color(route.color))
            .build()?;
        map.add_tool(line);
        for marker in &route.markers {
            let circle = CircleBuilder::new()
                .lat_coordinate(marker.latitude)
                .lon_coordinate(marker.longitude)
                .color(color(marker.color))
                .radius(5.)
                .build()?;
            map.add_tool(circle);
        }
    }
    Ok(map.encode_png()?)
}

#[derive(Debug, PartialEq)]
struct Viewport {
    zoom: u8,
    lat: f64,
    lon: f64,
}

/// Without any tools there is no extent to fit, so an empty view pins its
/// own center and zoom. Otherwise the map fits the routes.
fn fixed_viewport(view: &MapView) -> Option<Viewport> {
    if !view.routes.is_empty() {
        return None;
    }
    Some(Viewport {
        zoom: view.zoom,
        lat: view.center.0,
        lon: view.center.1,
    })
}

fn rgba(route_color: RouteColor) -> (u8, u8, u8, u8) {
    let (r, g, b) = route_color.rgb();
    (r, g, b, 255)
}

fn color(route_color: RouteColor) -> Color {
    let (r, g, b, a) = rgba(route_color);
    Color::new(true, r, g, b, a)
}
