use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

const FETCHDROP_ASCII: &str = r#"
  ███████╗███████╗████████╗ ██████╗██╗  ██╗██████╗ ██████╗  ██████╗ ██████╗
  ██╔════╝██╔════╝╚══██╔══╝██╔════╝██║  ██║██╔══██╗██╔══██╗██╔═══██╗██╔══██╗
  █████╗  █████╗     ██║   ██║     ███████║██║  ██║██████╔╝██║   ██║██████╔╝
  ██╔══╝  ██╔══╝     ██║   ██║     ██╔══██║██║  ██║██╔══██╗██║   ██║██╔═══╝
  ██║     ███████╗   ██║   ╚██████╗██║  ██║██████╔╝██║  ██║╚██████╔╝██║
  ╚═╝     ╚══════╝   ╚═╝    ╚═════╝╚═╝  ╚═╝╚═════╝ ╚═╝  ╚═╝ ╚═════╝ ╚═╝
"#;

/// Rows taken by the full banner (art plus tagline).
pub const BANNER_HEIGHT: u16 = 9;

/// Header art above the source picker. Falls back to a one-line title when
/// the area is too small for the art.
pub fn render_banner(f: &mut Frame, area: Rect, accent: Color) {
    let art = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    let tagline = Line::from(Span::styled(
        "Pick an archive, press Download, watch it land.",
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    ));

    let lines: Vec<Line> = if area.height >= BANNER_HEIGHT && area.width >= 78 {
        let mut lines: Vec<Line> = FETCHDROP_ASCII
            .lines()
            .map(|line| Line::from(Span::styled(line, art)))
            .collect();
        lines.push(Line::from(""));
        lines.push(tagline);
        lines
    } else {
        vec![Line::from(Span::styled("FETCHDROP", art)), tagline]
    };

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}
