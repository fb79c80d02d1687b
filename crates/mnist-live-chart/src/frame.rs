// ChartFrame — one fully laid-out rendering of the metric history
//
// Coordinates are in plot space: (0, 0) is the top-left corner of the plot
// area, x grows right, y grows down. The SVG viewBox is shifted by the left
// and top margins so plot space and SVG user space coincide.

use std::fmt::Write as _;

use crate::format::percent;

/// Radius of an epoch dot, also the tooltip hit radius.
pub const DOT_RADIUS: f64 = 5.0;

/// An axis tick: offset along the axis and its label (possibly empty).
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub offset: f64,
    pub label: String,
}

/// A validation-accuracy marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dot {
    pub cx: f64,
    pub cy: f64,
    pub epoch: u64,
    pub accuracy: f64,
}

/// What to show when the pointer is over an epoch dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tooltip {
    pub epoch: u64,
    /// Accuracy as a percentage with three significant figures.
    pub accuracy: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    /// Outer size including margins.
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_top: f64,
    /// Plot-area size.
    pub chart_width: f64,
    pub chart_height: f64,
    pub y_ticks: Vec<Tick>,
    pub x_ticks: Vec<Tick>,
    /// `(x, y)` vertices of the batch accuracy line.
    pub batch_line: Vec<(f64, f64)>,
    /// `(x, y)` vertices of the validation accuracy line.
    pub epoch_line: Vec<(f64, f64)>,
    pub dots: Vec<Dot>,
}

impl ChartFrame {
    /// Epoch dot under `(x, y)` in plot space. Later dots are drawn on top,
    /// so they win when dots overlap.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<Tooltip> {
        self.dots
            .iter()
            .rev()
            .find(|d| (d.cx - x).hypot(d.cy - y) <= DOT_RADIUS)
            .map(|d| Tooltip {
                epoch: d.epoch,
                accuracy: percent(d.accuracy, 3),
            })
    }

    /// SVG path data (`M x,y L x,y …`) for the batch line.
    pub fn batch_path(&self) -> String {
        path_data(&self.batch_line)
    }

    pub fn epoch_path(&self) -> String {
        path_data(&self.epoch_line)
    }

    /// Serialise as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let mut svg = String::with_capacity(2048);
        // Writing into a String cannot fail.
        let _ = self.write_svg(&mut svg);
        svg
    }

    fn write_svg(&self, out: &mut String) -> std::fmt::Result {
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}px" height="{h}px" viewBox="-{l} -{t} {w} {h}">"#,
            w = num(self.width),
            h = num(self.height),
            l = num(self.margin_left),
            t = num(self.margin_top),
        )?;

        writeln!(out, r#"<g class="y-axis" fill="none" font-size="10" text-anchor="end">"#)?;
        writeln!(
            out,
            r#"<path class="domain" stroke="currentColor" d="M-6,{h}H0V0H-6"/>"#,
            h = num(self.chart_height)
        )?;
        for tick in &self.y_ticks {
            writeln!(
                out,
                r#"<g class="tick" transform="translate(0,{y})"><line stroke="currentColor" x2="-6"/><text fill="currentColor" x="-9" dy="0.32em">{label}</text></g>"#,
                y = num(tick.offset),
                label = tick.label,
            )?;
        }
        writeln!(out, "</g>")?;

        writeln!(
            out,
            r#"<g class="x-axis" transform="translate(0,{h})" fill="none" font-size="10" text-anchor="middle">"#,
            h = num(self.chart_height)
        )?;
        writeln!(
            out,
            r#"<path class="domain" stroke="currentColor" d="M0,6V0H{w}V6"/>"#,
            w = num(self.chart_width)
        )?;
        for tick in &self.x_ticks {
            writeln!(
                out,
                r#"<g class="tick" transform="translate({x},0)"><line stroke="currentColor" y2="6"/><text fill="currentColor" y="9" dy="0.71em">{label}</text></g>"#,
                x = num(tick.offset),
                label = tick.label,
            )?;
        }
        writeln!(out, "</g>")?;

        writeln!(
            out,
            r#"<path class="line batch-line" fill="none" stroke="steelblue" d="{}"/>"#,
            self.batch_path()
        )?;
        writeln!(
            out,
            r#"<path class="line epoch-line" fill="none" stroke="darkorange" d="{}"/>"#,
            self.epoch_path()
        )?;
        for dot in &self.dots {
            writeln!(
                out,
                r#"<circle class="dot" r="{r}" cx="{x}" cy="{y}"><title>Epoch {e}: {acc}</title></circle>"#,
                r = num(DOT_RADIUS),
                x = num(dot.cx),
                y = num(dot.cy),
                e = dot.epoch,
                acc = percent(dot.accuracy, 3),
            )?;
        }
        writeln!(out, "</svg>")
    }
}

fn path_data(points: &[(f64, f64)]) -> String {
    let mut d = String::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        let _ = write!(d, "{}{},{}", if i == 0 { 'M' } else { 'L' }, num(x), num(y));
    }
    d
}

/// Coordinate with at most three decimals and no trailing zeros.
fn num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_dots(dots: Vec<Dot>) -> ChartFrame {
        ChartFrame {
            width: 100.0,
            height: 100.0,
            margin_left: 45.0,
            margin_top: 15.0,
            chart_width: 40.0,
            chart_height: 55.0,
            y_ticks: Vec::new(),
            x_ticks: Vec::new(),
            batch_line: vec![(0.0, 55.0), (40.0, 1.5)],
            epoch_line: Vec::new(),
            dots,
        }
    }

    #[test]
    fn test_num_trims() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(0.125), "0.125");
        assert_eq!(num(1.5), "1.5");
        assert_eq!(num(-0.0001), "0");
    }

    #[test]
    fn test_path_data() {
        let f = frame_with_dots(Vec::new());
        assert_eq!(f.batch_path(), "M0,55L40,1.5");
        assert_eq!(f.epoch_path(), "");
    }

    #[test]
    fn test_hit_test_radius() {
        let f = frame_with_dots(vec![Dot {
            cx: 20.0,
            cy: 10.0,
            epoch: 3,
            accuracy: 0.97345,
        }]);
        let tip = f.hit_test(23.0, 14.0).unwrap();
        assert_eq!(tip.epoch, 3);
        assert_eq!(tip.accuracy, "97.3%");
        assert!(f.hit_test(24.0, 14.0).is_none());
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let dot = |epoch| Dot {
            cx: 10.0,
            cy: 10.0,
            epoch,
            accuracy: 0.5,
        };
        let f = frame_with_dots(vec![dot(1), dot(2)]);
        assert_eq!(f.hit_test(10.0, 10.0).unwrap().epoch, 2);
    }

    #[test]
    fn test_svg_contains_parts() {
        let svg = frame_with_dots(Vec::new()).to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="-45 -15 100 100""#));
        assert!(svg.contains("batch-line"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
