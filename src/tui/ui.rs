use crate::core::output::OutputRecord;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{TitleBar, Transcript};
use crate::widget::TerminalWidget;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::widgets::Block;

pub fn draw_ui(frame: &mut Frame, widget: &TerminalWidget, tui: &mut TuiState) {
    let palette = tui.palette;
    frame.render_widget(Block::default().style(palette.background), frame.area());

    let area = if palette.framed {
        let block = Block::bordered()
            .title(" Terminal ")
            .style(palette.background)
            .border_style(palette.status);
        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());
        inner
    } else {
        frame.area()
    };

    use Constraint::{Length, Min};
    let [title_area, main_area] = Layout::vertical([Length(1), Min(0)]).areas(area);

    let state = widget.state();
    let mut transcript = Transcript {
        records: widget.records(),
        active: active_line_text(&widget.prompt(), state.editor.active_line()),
        palette,
        state: &mut tui.transcript,
    };
    transcript.render(frame, main_area);

    let mut title_bar = TitleBar::new(
        state.mode,
        state.session,
        widget.is_playing(),
        tui.transcript.has_unseen_content,
    );
    title_bar.style = palette.status;
    title_bar.render(frame, title_area);

    if let Some(cursor) = tui.transcript.cursor {
        frame.set_cursor_position(cursor);
    }
}

/// The active line exactly as it will be echoed on Enter.
pub fn active_line_text(prompt: &str, line: &str) -> String {
    OutputRecord::prefixed(prompt, line).to_string()
}
