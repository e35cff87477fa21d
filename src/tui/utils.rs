use std::time::{Duration, Instant};

use ratatui::widgets::{ListState, ScrollbarState};

use crate::tui::app::Direction;

/// Two `g` presses within this window jump to the top of a list.
const DOUBLE_G_WINDOW: Duration = Duration::from_millis(500);

/// Editing helpers for the flag inputs. Positions count `char`s, not bytes.
pub mod cursor {
    pub fn end_of(input: &str) -> usize {
        input.chars().count()
    }

    pub fn left(index: &mut usize) {
        *index = index.saturating_sub(1);
    }

    pub fn right(input: &str, index: &mut usize) {
        *index = (*index + 1).min(end_of(input));
    }

    pub fn insert(input: &mut String, index: &mut usize, c: char) {
        let at = (*index).min(end_of(input));
        input.insert(byte_offset(input, at), c);
        *index = at + 1;
    }

    /// Removes the character before the cursor.
    pub fn backspace(input: &mut String, index: &mut usize) {
        let at = (*index).min(end_of(input));
        if at == 0 {
            return;
        }
        input.remove(byte_offset(input, at - 1));
        *index = at - 1;
    }

    /// First visible character of an input `width` columns wide, chosen so
    /// the cursor cell stays inside it.
    pub fn scroll_offset(index: usize, width: usize) -> usize {
        (index + 1).saturating_sub(width.max(1))
    }

    fn byte_offset(input: &str, index: usize) -> usize {
        input
            .char_indices()
            .nth(index)
            .map_or(input.len(), |(i, _)| i)
    }
}

pub fn handle_list_navigation(
    dir: Direction,
    list_state: &mut ListState,
    len: usize,
    scroll_state: Option<&mut ScrollbarState>,
    last_g_press_time: &mut Option<Instant>,
) {
    if len == 0 {
        list_state.select(None);
        return;
    }

    let current = list_state.selected().unwrap_or(0);
    let next = match dir {
        Direction::Up => current.saturating_sub(1),
        Direction::Down => (current + 1).min(len - 1),
        Direction::Bottom => len - 1,
        Direction::Top => {
            let now = Instant::now();
            match last_g_press_time.take() {
                Some(prev) if now.duration_since(prev) <= DOUBLE_G_WINDOW => 0,
                _ => {
                    *last_g_press_time = Some(now);
                    current
                }
            }
        }
    };

    list_state.select(Some(next));
    if let Some(scroll_state) = scroll_state {
        *scroll_state = scroll_state.content_length(len).position(next);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cursor_editing_multibyte() {
        let mut input = String::from("Dark_Flag{}");
        let mut index = 10;
        cursor::insert(&mut input, &mut index, 'ü');
        cursor::insert(&mut input, &mut index, 'x');
        assert_eq!(input, "Dark_Flag{üx}");
        assert_eq!(index, 12);

        cursor::left(&mut index);
        cursor::backspace(&mut input, &mut index);
        assert_eq!(input, "Dark_Flag{x}");
        assert_eq!(index, 10);

        for _ in 0..3 {
            cursor::right(&input, &mut index);
        }
        assert_eq!(index, cursor::end_of(&input));
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut input = String::from("abc");
        let mut index = 0;
        cursor::backspace(&mut input, &mut index);
        assert_eq!(input, "abc");
        assert_eq!(index, 0);

        cursor::left(&mut index);
        assert_eq!(index, 0);
    }

    #[test]
    fn test_stale_index_is_clamped() {
        let mut input = String::from("ab");
        let mut index = 9;
        cursor::insert(&mut input, &mut index, 'c');
        assert_eq!(input, "abc");
        assert_eq!(index, 3);

        let mut index = 9;
        cursor::backspace(&mut input, &mut index);
        assert_eq!(input, "ab");
        assert_eq!(index, 2);
    }

    #[test]
    fn test_scroll_offset_keeps_cursor_visible() {
        assert_eq!(cursor::scroll_offset(0, 10), 0);
        assert_eq!(cursor::scroll_offset(9, 10), 0);
        assert_eq!(cursor::scroll_offset(10, 10), 1);
        assert_eq!(cursor::scroll_offset(60, 38), 23);
        assert_eq!(cursor::scroll_offset(5, 0), 5);
    }

    #[test]
    fn test_list_navigation() {
        let mut state = ListState::default();
        let mut last_g = None;

        handle_list_navigation(Direction::Down, &mut state, 3, None, &mut last_g);
        assert_eq!(state.selected(), Some(1));
        handle_list_navigation(Direction::Bottom, &mut state, 3, None, &mut last_g);
        assert_eq!(state.selected(), Some(2));
        handle_list_navigation(Direction::Down, &mut state, 3, None, &mut last_g);
        assert_eq!(state.selected(), Some(2));

        // single g press only arms the jump
        handle_list_navigation(Direction::Top, &mut state, 3, None, &mut last_g);
        assert_eq!(state.selected(), Some(2));
        handle_list_navigation(Direction::Top, &mut state, 3, None, &mut last_g);
        assert_eq!(state.selected(), Some(0));

        handle_list_navigation(Direction::Up, &mut state, 0, None, &mut last_g);
        assert_eq!(state.selected(), None);
    }
}
