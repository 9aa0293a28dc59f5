/*!
Tree builder: indentation-coded AST text → binary [`Node`] tree.

Input format
------------

Each non-blank line is `<indentation><lexeme>`. A node's children are the
following lines indented exactly two columns deeper, up to the next line at
the node's own depth or shallower. The first child becomes the left branch,
the second the right branch.

```text
+          (+ 1 (* 2 3))
  1
  *
    2
    3
```

The builder is a single-pass recursive descent over a cursor into the
scanned lines, so each line is visited once.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `TreeBuilder::new`, `build`  | `info` | Lifecycle milestones.                     |
| `node`                       | `debug`| Node creation.                            |
| Skipped / trailing lines     | `warn` | Input that does not fit a binary tree.    |
*/

use log::{debug, info, warn};

use crate::error::{InterpError, Result};
use crate::node::Node;
use crate::token::Token;

/// Last line printed by the front-end when it rejects its input.
pub const SYNTAX_ERROR: &str = "syntax error";

/// One scanned line of AST text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstLine<'a> {
    /// 1‑based line number in the input.
    pub number: usize,

    /// Count of leading whitespace characters.
    pub indent: usize,

    pub lexeme: &'a str,
}

impl<'a> AstLine<'a> {
    /// Split a raw line into indentation and lexeme; `None` for blank lines.
    pub fn scan(number: usize, raw: &'a str) -> Option<Self> {
        let contents = raw.trim_start();
        let lexeme = contents.trim_end();

        if lexeme.is_empty() {
            return None;
        }

        let indent = raw[..raw.len() - contents.len()].chars().count();

        Some(Self {
            number,
            indent,
            lexeme,
        })
    }
}

/// Scan `text` into AST lines, rejecting front-end failure output.
pub fn scan_lines(text: &str) -> Result<Vec<AstLine<'_>>> {
    let lines: Vec<AstLine<'_>> = text
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| AstLine::scan(i + 1, raw))
        .collect();

    if lines.last().is_some_and(|line| line.lexeme == SYNTAX_ERROR) {
        debug!("Front-end output ends with '{}'", SYNTAX_ERROR);

        return Err(InterpError::FrontEnd {
            output: text.to_string(),
        });
    }

    Ok(lines)
}

/// Build the tree described by `text`.
pub fn parse_ast(text: &str) -> Result<Node> {
    let lines = scan_lines(text)?;
    TreeBuilder::new(&lines).build()
}

/// Build the tree described by already split lines.
pub fn parse_lines<I, S>(lines: I) -> Result<Node>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let owned: Vec<S> = lines.into_iter().collect();
    let scanned: Vec<AstLine<'_>> = owned
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| AstLine::scan(i + 1, raw.as_ref()))
        .collect();

    TreeBuilder::new(&scanned).build()
}

/// Cursor-based builder over scanned lines.
pub struct TreeBuilder<'l, 'a> {
    lines: &'l [AstLine<'a>],
    cursor: usize,
}

impl<'l, 'a> TreeBuilder<'l, 'a> {
    pub fn new(lines: &'l [AstLine<'a>]) -> Self {
        info!("TreeBuilder created with {} lines", lines.len());

        Self { lines, cursor: 0 }
    }

    /// Build the single root node. Consumes the builder.
    pub fn build(mut self) -> Result<Node> {
        if self.lines.is_empty() {
            return Err(InterpError::input("empty AST line sequence"));
        }

        let root = self.node();

        if let Some(extra) = self.lines.get(self.cursor) {
            warn!(
                "Ignoring {} line(s) after the root, starting at line {} ('{}')",
                self.lines.len() - self.cursor,
                extra.number,
                extra.lexeme
            );
        }

        info!("Built tree rooted at '{}'", root);

        Ok(root)
    }

    // ───────────────────────── descent ─────────────────────────

    /// Build the node at the cursor and everything nested under it.
    /// Precondition: `self.cursor < self.lines.len()`.
    fn node(&mut self) -> Node {
        let line = self.lines[self.cursor];
        self.cursor += 1;

        let child_indent = line.indent + 2;
        let mut children: Vec<Node> = Vec::with_capacity(2);

        while let Some(next) = self.lines.get(self.cursor) {
            if next.indent <= line.indent {
                break;
            }

            if next.indent == child_indent && children.len() < 2 {
                children.push(self.node());
            } else {
                warn!(
                    "Skipping line {} ('{}', indent {}) under '{}' at line {}",
                    next.number, next.lexeme, next.indent, line.lexeme, line.number
                );
                self.cursor += 1;
            }
        }

        let mut children = children.into_iter();
        let left = children.next();
        let right = children.next();

        debug!(
            "Node '{}' (line {}): left={}, right={}",
            line.lexeme,
            line.number,
            left.is_some(),
            right.is_some()
        );

        Node::new(Token::new(line.lexeme), left, right)
    }
}
