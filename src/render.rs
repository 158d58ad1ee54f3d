//! SVG emission for a [`Drawing`].
//!
//! Markup is built with Maud. Every element is written with an explicit
//! (empty) body, so the output is well-formed XML and not HTML void tags.
//! Text is styled from its [`TextRole`] here, at emission time; nothing
//! rewrites the document afterwards.

use crate::config::{TextStyle, TextStyles};
use crate::geo::Xy;
use crate::layout::{Anchor, Drawing, Shape, TextRole};
use maud::{Markup, PreEscaped, html};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Number with at most two decimals and no trailing zeros.
pub fn fmt_num(value: f64) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        s => s.to_string(),
    }
}

fn path_data(points: &[Xy]) -> String {
    let mut d = String::with_capacity(points.len() * 14);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        d.push(if i == 0 { 'M' } else { 'L' });
        d.push_str(&fmt_num(p.x));
        d.push(',');
        d.push_str(&fmt_num(p.y));
    }
    d
}

fn style_for(styles: &TextStyles, role: TextRole) -> &TextStyle {
    match role {
        TextRole::Title => &styles.title,
        TextRole::YearLabel => &styles.year_label,
        TextRole::DistanceLabel => &styles.distance_label,
        TextRole::LegendLabel => &styles.legend_label,
        TextRole::LegendValue => &styles.legend_value,
    }
}

fn anchor_attr(anchor: Anchor) -> &'static str {
    match anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
        Anchor::End => "end",
    }
}

fn render_shape(shape: &Shape, styles: &TextStyles) -> Markup {
    match shape {
        Shape::Polyline {
            points,
            color,
            width,
        } => html! {
            path d=(path_data(points)) fill="none" stroke=(color) stroke-width=(fmt_num(*width))
                stroke-linecap="round" stroke-linejoin="round" {}
        },
        Shape::Dot {
            center,
            radius,
            color,
        } => html! {
            circle
                cx=(fmt_num(center.x))
                cy=(fmt_num(center.y))
                r=(fmt_num(*radius))
                fill=(color) {}
        },
        Shape::Rect {
            origin,
            width,
            height,
            color,
        } => html! {
            rect x=(fmt_num(origin.x)) y=(fmt_num(origin.y)) width=(fmt_num(*width))
                height=(fmt_num(*height)) fill=(color) {}
        },
        Shape::Ring {
            center,
            radius,
            color,
            width,
        } => html! {
            circle cx=(fmt_num(center.x)) cy=(fmt_num(center.y)) r=(fmt_num(*radius)) fill="none"
                stroke=(color) stroke-width=(fmt_num(*width)) {}
        },
        Shape::Text {
            position,
            content,
            role,
            anchor,
            color,
        } => {
            let style = style_for(styles, *role);
            html! {
                text x=(fmt_num(position.x)) y=(fmt_num(position.y)) fill=(color)
                    font-size=(fmt_num(style.size)) font-family=(style.family)
                    font-weight=(style.weight) text-anchor=(anchor_attr(*anchor)) {
                    (content)
                }
            }
        }
    }
}

/// Render a complete SVG document.
pub fn render(drawing: &Drawing, styles: &TextStyles) -> Markup {
    let width = fmt_num(drawing.canvas.width);
    let height = fmt_num(drawing.canvas.height);
    html! {
        (PreEscaped(XML_DECLARATION))
        svg xmlns=(SVG_NS) width=(width) height=(height) viewBox={ "0 0 " (width) " " (height) } {
            rect x="0" y="0" width=(width) height=(height) fill=(drawing.background) {}
            @for shape in &drawing.shapes {
                (render_shape(shape, styles))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Canvas;

    fn drawing() -> Drawing {
        let mut drawing = Drawing::new(
            Canvas {
                width: 200.0,
                height: 300.0,
            },
            "#222222",
        );
        drawing.push(Shape::Polyline {
            points: vec![Xy::new(10.0, 10.0), Xy::new(20.5, 30.25), Xy::new(1.0 / 3.0, 2.0)],
            color: "#4DD2FF".into(),
            width: 0.5,
        });
        drawing.push(Shape::Dot {
            center: Xy::new(100.0, 150.0),
            radius: 0.5,
            color: "#FFFF00".into(),
        });
        drawing.push(Shape::text(
            Xy::new(100.0, 20.0),
            "Tom & Jerry <3",
            TextRole::Title,
            Anchor::Middle,
            "#FFFFFF",
        ));
        drawing
    }

    fn svg() -> String {
        render(&drawing(), &TextStyles::default()).into_string()
    }

    #[test]
    fn fmt_num_trims() {
        assert_eq!(fmt_num(10.0), "10");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(1.0 / 3.0), "0.33");
        assert_eq!(fmt_num(2.999), "3");
        assert_eq!(fmt_num(-0.001), "0");
        assert_eq!(fmt_num(-12.5), "-12.5");
    }

    #[test]
    fn path_data_moves_then_lines() {
        assert_eq!(
            path_data(&[Xy::new(0.0, 0.0), Xy::new(1.5, 2.0)]),
            "M0,0 L1.5,2"
        );
    }

    #[test]
    fn document_header_and_canvas() {
        let svg = svg();
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><svg"#));
        assert!(svg.contains(r#"viewBox="0 0 200 300""#));
        assert!(svg.contains(r##"width="200" height="300" fill="#222222""##));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn elements_are_closed() {
        let svg = svg();
        for tag in ["rect", "path", "circle", "text"] {
            assert_eq!(
                svg.matches(&format!("<{tag} ")).count(),
                svg.matches(&format!("</{tag}>")).count(),
                "{tag}"
            );
        }
        assert_eq!(svg.matches("<path ").count(), 1);
        assert_eq!(svg.matches("<circle ").count(), 1);
    }

    #[test]
    fn polyline_is_round_capped_path() {
        let svg = svg();
        assert!(svg.contains(r#"d="M10,10 L20.5,30.25 L0.33,2""#));
        assert!(svg.contains(r#"stroke-linecap="round""#));
        assert!(svg.contains(r##"fill="none" stroke="#4DD2FF" stroke-width="0.5""##));
    }

    #[test]
    fn text_styled_by_role_and_escaped() {
        let svg = svg();
        assert!(svg.contains(r#"font-size="8""#));
        assert!(svg.contains(r#"font-weight="700""#));
        assert!(svg.contains(r#"text-anchor="middle""#));
        assert!(svg.contains("Tom &amp; Jerry &lt;3"));
    }

    #[test]
    fn custom_text_size_applied() {
        let mut styles = TextStyles::default();
        styles.title.size = 6.0;
        let svg = render(&drawing(), &styles).into_string();
        assert!(svg.contains(r#"font-size="6""#));
    }
}
