//! Styling for note blocks and inline ranges.
//!
//! Uses ANSI colors that adapt to the terminal's color palette.

use ratatui::style::{Color, Modifier, Style};

use crate::note::{BlockType, InlineStyle};

/// Base style for a block type.
pub fn style_for_block(kind: &BlockType) -> Style {
    match kind {
        BlockType::Header(1) => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        BlockType::Header(2) => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        BlockType::Header(3) => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        BlockType::Header(_) => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
        BlockType::CodeBlock => Style::default()
            .fg(Color::Indexed(245))
            .add_modifier(Modifier::DIM),
        BlockType::Blockquote => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::ITALIC),
        BlockType::Atomic => Style::default().fg(Color::Magenta),
        BlockType::Unstyled
        | BlockType::UnorderedListItem
        | BlockType::OrderedListItem
        | BlockType::Other(_) => Style::default(),
    }
}

/// Merge inline styles onto a block's base style. Custom styles render plain.
pub fn style_for_inline<'a>(
    base: Style,
    styles: impl IntoIterator<Item = &'a InlineStyle>,
) -> Style {
    styles.into_iter().fold(base, |style, inline| match inline {
        InlineStyle::Bold => style.add_modifier(Modifier::BOLD),
        InlineStyle::Italic => style.add_modifier(Modifier::ITALIC),
        InlineStyle::Underline => style.add_modifier(Modifier::UNDERLINED),
        InlineStyle::Strikethrough => style.add_modifier(Modifier::CROSSED_OUT),
        InlineStyle::Code => style
            .fg(Color::Red)
            .remove_modifier(Modifier::DIM)
            .add_modifier(Modifier::BOLD),
        InlineStyle::Custom(_) => style,
    })
}

/// Gutter text before a block. `ordinal` numbers ordered list items.
pub fn block_prefix(kind: &BlockType, depth: u32, ordinal: usize) -> String {
    let indent = "  ".repeat(usize::try_from(depth).unwrap_or(0));
    match kind {
        BlockType::UnorderedListItem => format!("{indent}• "),
        BlockType::OrderedListItem => format!("{indent}{ordinal}. "),
        BlockType::Blockquote => format!("{indent}│ "),
        BlockType::CodeBlock => format!("{indent}  "),
        _ => indent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_styles_are_bold() {
        for level in 1..=6 {
            let style = style_for_block(&BlockType::Header(level));
            assert!(style.add_modifier.contains(Modifier::BOLD));
        }
    }

    #[test]
    fn test_h1_is_underlined() {
        let style = style_for_block(&BlockType::Header(1));
        assert!(style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_inline_styles_stack() {
        let styles = [InlineStyle::Bold, InlineStyle::Italic];
        let style = style_for_inline(Style::default(), &styles);
        assert!(style.add_modifier.contains(Modifier::BOLD | Modifier::ITALIC));
    }

    #[test]
    fn test_inline_code_removes_dim() {
        let base = style_for_block(&BlockType::CodeBlock);
        let style = style_for_inline(base, &[InlineStyle::Code]);
        assert!(!style.add_modifier.contains(Modifier::DIM));
        assert_eq!(style.fg, Some(Color::Red));
    }

    #[test]
    fn test_list_prefixes() {
        assert_eq!(block_prefix(&BlockType::UnorderedListItem, 0, 1), "• ");
        assert_eq!(block_prefix(&BlockType::OrderedListItem, 1, 3), "  3. ");
        assert_eq!(block_prefix(&BlockType::Unstyled, 0, 1), "");
    }
}
