//! System message collection for the parser.

use super::node::{Attributes, MessageLevel, Node, Tag};
use log::{trace, warn};

/// Collects system messages raised while parsing one document.
///
/// Messages below the threshold are dropped. Kept messages become
/// `system_message` nodes that the block parser places after the element
/// that raised them.
#[derive(Debug)]
pub(crate) struct Reporter {
    source: String,
    threshold: MessageLevel,
    pending: Vec<Node>,
}

impl Reporter {
    pub(crate) fn new(source: impl Into<String>, threshold: MessageLevel) -> Self {
        Self {
            source: source.into(),
            threshold,
            pending: Vec::new(),
        }
    }

    pub(crate) fn report(&mut self, level: MessageLevel, line: usize, message: impl Into<String>) {
        self.report_with(level, line, message, Vec::new());
    }

    /// Reports a message carrying extra detail nodes, such as the offending source.
    pub(crate) fn report_with(
        &mut self,
        level: MessageLevel,
        line: usize,
        message: impl Into<String>,
        details: Vec<Node>,
    ) {
        let message = message.into();
        if level < self.threshold {
            trace!(
                "{}:{}: suppressed ({}) {}",
                self.source,
                line,
                level.as_str(),
                message
            );
            return;
        }
        warn!("{}:{}: ({}) {}", self.source, line, level.as_str(), message);

        let mut children = vec![Node::with_text(
            Tag::Paragraph,
            Some(line),
            message.clone(),
            message,
        )];
        children.extend(details);
        let node = Node::new(Tag::SystemMessage, Some(line))
            .with_children(children)
            .with_attributes(Attributes {
                level: Some(level),
                ..Default::default()
            });
        self.pending.push(node);
    }

    pub(crate) fn info(&mut self, line: usize, message: impl Into<String>) {
        self.report(MessageLevel::Info, line, message);
    }

    pub(crate) fn warning(&mut self, line: usize, message: impl Into<String>) {
        self.report(MessageLevel::Warning, line, message);
    }

    pub(crate) fn error(&mut self, line: usize, message: impl Into<String>) {
        self.report(MessageLevel::Error, line, message);
    }

    /// Takes the messages kept since the last call.
    pub(crate) fn drain(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_below_threshold_are_dropped() {
        let mut reporter = Reporter::new("doc.rst", MessageLevel::Error);
        reporter.info(1, "info");
        reporter.warning(2, "warning");
        reporter.error(3, "Unknown directive type \"foo\".");

        let kept = reporter.drain();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].tag, Tag::SystemMessage);
        assert_eq!(kept[0].line, Some(3));
        assert_eq!(kept[0].attributes.level, Some(MessageLevel::Error));
        assert_eq!(kept[0].children[0].astext(), "Unknown directive type \"foo\".");
        assert!(reporter.drain().is_empty());
    }
}
