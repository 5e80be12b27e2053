use std::f64::consts::PI;
use std::fs::File;
use std::path::Path;

use cairo::{Context, FontSlant, FontWeight, Format, ImageSurface};
use itertools::Itertools;
use itertools_num::linspace;

use crate::report::aoi::AreaOfInterest;
use crate::sample::Sample;
use crate::util::Engineering;
use crate::Result;

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 60.0;
const TICKS: usize = 6;
const FONT: &str = "Sans";

const COLORS: [(u8, u8, u8); 3] = [(57, 106, 177), (204, 37, 41), (0, 0, 0)];

lazy_static! {
    static ref COLORS_F64: Vec<(f64, f64, f64)> = COLORS
        .iter()
        .cloned()
        .map(|(r, g, b)| (
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0
        ))
        .collect_vec();
}

/// Screen rectangle of one panel and the data window it shows
#[derive(Copy, Clone, Debug)]
struct Panel {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    aoi: AreaOfInterest,
}

impl Panel {
    fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        let x_k = self.width / (self.aoi.max_x - self.aoi.min_x);
        let y_k = self.height / (self.aoi.max_y - self.aoi.min_y);
        (
            self.x + (x - self.aoi.min_x) * x_k,
            self.y + self.height - (y - self.aoi.min_y) * y_k,
        )
    }
}

struct Series<'a> {
    title: &'a str,
    y_label: &'a str,
    points: Vec<(f64, f64)>,
    mpp: (f64, f64),
    color: (f64, f64, f64),
}

fn draw_text(cr: &Context, x: f64, y: f64, size: f64, text: &str) {
    cr.select_font_face(FONT, FontSlant::Normal, FontWeight::Normal);
    cr.set_font_size(size);
    cr.move_to(x, y);
    cr.show_text(text);
}

fn draw_axes(cr: &Context, panel: &Panel, x_label: &str, y_label: &str) {
    cr.set_source_rgb(0.0, 0.0, 0.0);
    cr.set_line_width(1.0);
    cr.rectangle(panel.x, panel.y, panel.width, panel.height);
    cr.stroke();

    for x in linspace(panel.aoi.min_x, panel.aoi.max_x, TICKS) {
        let (sx, sy) = panel.to_screen(x, panel.aoi.min_y);
        cr.set_source_rgba(0.0, 0.0, 0.0, 0.15);
        cr.move_to(sx, panel.y);
        cr.line_to(sx, sy);
        cr.stroke();
        cr.set_source_rgb(0.0, 0.0, 0.0);
        draw_text(cr, sx - 18.0, sy + 18.0, 11.0, &Engineering(x).to_string());
    }
    for y in linspace(panel.aoi.min_y, panel.aoi.max_y, TICKS) {
        let (sx, sy) = panel.to_screen(panel.aoi.min_x, y);
        cr.set_source_rgba(0.0, 0.0, 0.0, 0.15);
        cr.move_to(sx, sy);
        cr.line_to(panel.x + panel.width, sy);
        cr.stroke();
        cr.set_source_rgb(0.0, 0.0, 0.0);
        draw_text(cr, sx - 62.0, sy + 4.0, 11.0, &Engineering(y).to_string());
    }

    draw_text(
        cr,
        panel.x + panel.width / 2.0 - 30.0,
        panel.y + panel.height + 42.0,
        13.0,
        x_label,
    );

    cr.save();
    cr.translate(panel.x - 66.0, panel.y + panel.height / 2.0 + 40.0);
    cr.rotate(-PI / 2.0);
    draw_text(cr, 0.0, 0.0, 13.0, y_label);
    cr.restore();
}

fn draw_series(cr: &Context, panel: &Panel, series: &Series<'_>) {
    draw_axes(cr, panel, "Voltage (V)", series.y_label);

    cr.set_source_rgb(0.0, 0.0, 0.0);
    draw_text(cr, panel.x, panel.y - 12.0, 15.0, series.title);

    let (r, g, b) = series.color;
    cr.set_source_rgb(r, g, b);
    cr.set_line_width(1.5);
    for (ix, &(x, y)) in series.points.iter().enumerate() {
        let (sx, sy) = panel.to_screen(x, y);
        if ix == 0 {
            cr.move_to(sx, sy);
        } else {
            cr.line_to(sx, sy);
        }
    }
    cr.stroke();
    for &(x, y) in series.points.iter() {
        let (sx, sy) = panel.to_screen(x, y);
        cr.arc(sx, sy, 2.0, 0.0, PI * 2.0);
        cr.fill();
    }

    let (r, g, b) = COLORS_F64[2];
    let (mx, my) = panel.to_screen(series.mpp.0, series.mpp.1);
    let (ox, oy) = panel.to_screen(panel.aoi.min_x, panel.aoi.min_y);

    cr.save();
    cr.set_source_rgba(r, g, b, 0.6);
    cr.set_dash(&[6.0, 4.0], 0.0);
    cr.move_to(ox, my);
    cr.line_to(mx, my);
    cr.line_to(mx, oy);
    cr.stroke();
    cr.restore();

    cr.set_source_rgb(r, g, b);
    cr.arc(mx, my, 6.0, 0.0, PI * 2.0);
    cr.fill();
}

/// Draws the I-V and P-V curves side by side with the maximum power point marked
pub fn render(
    samples: &[Sample],
    mpp: &Sample,
    title: &str,
    width: i32,
    height: i32,
) -> Result<ImageSurface> {
    let surface = ImageSurface::create(Format::ARgb32, width, height)
        .map_err(|_| failure::err_msg("Can't create an off-screen surface"))?;
    let cr = Context::new(&surface);

    cr.set_source_rgb(1.0, 1.0, 1.0);
    cr.paint();

    cr.set_source_rgb(0.0, 0.0, 0.0);
    draw_text(&cr, MARGIN_LEFT, 28.0, 18.0, title);
    draw_text(
        &cr,
        f64::from(width) / 2.0 + MARGIN_LEFT,
        28.0,
        14.0,
        &format!(
            "MPP: {:.2} W @ {:.2} V, {:.2} A",
            mpp.power(),
            mpp.voltage(),
            mpp.current()
        ),
    );

    let panel_width = f64::from(width) / 2.0 - MARGIN_LEFT - MARGIN_RIGHT;
    let panel_height = f64::from(height) - MARGIN_TOP - MARGIN_BOTTOM;

    let series = [
        Series {
            title: "I-V Curve",
            y_label: "Current (A)",
            points: samples.iter().map(|s| (s.voltage(), s.current())).collect(),
            mpp: (mpp.voltage(), mpp.current()),
            color: COLORS_F64[0],
        },
        Series {
            title: "P-V Curve",
            y_label: "Power (W)",
            points: samples.iter().map(|s| (s.voltage(), s.power())).collect(),
            mpp: (mpp.voltage(), mpp.power()),
            color: COLORS_F64[1],
        },
    ];

    for (ix, series) in series.iter().enumerate() {
        let panel = Panel {
            x: ix as f64 * f64::from(width) / 2.0 + MARGIN_LEFT,
            y: MARGIN_TOP,
            width: panel_width,
            height: panel_height,
            aoi: AreaOfInterest::enclosing(series.points.iter().cloned()).extended(),
        };
        draw_series(&cr, &panel, series);
    }

    drop(cr);
    surface.flush();
    Ok(surface)
}

/// Renders the sweep and writes it as a PNG file
pub fn save_png(samples: &[Sample], mpp: &Sample, title: &str, path: &Path) -> Result<()> {
    let surface = render(
        samples,
        mpp,
        title,
        crate::config::PLOT_WIDTH,
        crate::config::PLOT_HEIGHT,
    )?;
    let mut file = File::create(path)?;
    surface
        .write_to_png(&mut file)
        .map_err(|e| failure::format_err!("Can't write {}: {:?}", path.display(), e))?;
    debug!("Wrote plot to {}", path.display());
    Ok(())
}
