/// Built-in sample catalog used when no search index or CMS is configured.
use crate::model::{resolve_compliance, ContentRecord, RecordSource};

struct DemoEntry {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    kind: &'static str,
    tags: &'static [&'static str],
    score: u32,
    url: &'static str,
}

const DEMO_ENTRIES: [DemoEntry; 8] = [
    DemoEntry {
        id: "1",
        title: "Getting Started with Web Accessibility",
        description: "Learn the fundamentals of web accessibility and WCAG guidelines. This comprehensive guide covers semantic HTML, ARIA attributes, and best practices.",
        kind: "Tutorial",
        tags: &["accessibility", "WCAG", "beginners", "HTML"],
        score: 95,
        url: "/tutorials/getting-started-accessibility",
    },
    DemoEntry {
        id: "2",
        title: "AI-Powered Alt Text Generation",
        description: "Automatically generate descriptive alt text for images using AI. Improve your content accessibility with machine learning.",
        kind: "Feature",
        tags: &["AI", "alt-text", "images", "automation"],
        score: 88,
        url: "/features/ai-alt-text",
    },
    DemoEntry {
        id: "3",
        title: "Storyblok Integration Guide",
        description: "Connect your Storyblok CMS with A11yGenie for automated accessibility checks and content optimization.",
        kind: "Documentation",
        tags: &["Storyblok", "CMS", "integration", "guide"],
        score: 92,
        url: "/docs/storyblok-integration",
    },
    DemoEntry {
        id: "4",
        title: "Color Contrast Checker Tool",
        description: "Ensure your color combinations meet WCAG AA and AAA standards for optimal readability.",
        kind: "Tool",
        tags: &["color", "contrast", "WCAG", "design"],
        score: 90,
        url: "/tools/color-contrast",
    },
    DemoEntry {
        id: "5",
        title: "Screen Reader Testing Best Practices",
        description: "Comprehensive guide to testing your website with popular screen readers like NVDA, JAWS, and VoiceOver.",
        kind: "Tutorial",
        tags: &["screen-readers", "testing", "NVDA", "JAWS"],
        score: 87,
        url: "/tutorials/screen-reader-testing",
    },
    DemoEntry {
        id: "6",
        title: "Accessible Form Design Patterns",
        description: "Design forms that work for everyone with proper labels, error messages, and keyboard navigation.",
        kind: "Tutorial",
        tags: &["forms", "UX", "design", "patterns"],
        score: 93,
        url: "/tutorials/accessible-forms",
    },
    DemoEntry {
        id: "7",
        title: "Keyboard Navigation Implementation",
        description: "Make your web application fully navigable using only a keyboard for better accessibility.",
        kind: "Documentation",
        tags: &["keyboard", "navigation", "focus", "interaction"],
        score: 91,
        url: "/docs/keyboard-navigation",
    },
    DemoEntry {
        id: "8",
        title: "Accessible Data Tables",
        description: "Create data tables that are readable by screen readers with proper headers and captions.",
        kind: "Tutorial",
        tags: &["tables", "data", "HTML", "semantic"],
        score: 89,
        url: "/tutorials/accessible-tables",
    },
];

pub fn demo_corpus() -> Vec<ContentRecord> {
    DEMO_ENTRIES
        .iter()
        .map(|entry| {
            let (accessibility_score, wcag_compliant) =
                resolve_compliance(Some(entry.score), Some(true));
            ContentRecord {
                id: entry.id.to_string(),
                title: entry.title.to_string(),
                description: entry.description.to_string(),
                kind: entry.kind.to_string(),
                tags: entry.tags.iter().map(|t| t.to_string()).collect(),
                accessibility_score,
                wcag_compliant,
                url: Some(entry.url.to_string()),
                alt_text: None,
                ai_enhanced: false,
                ai_summary: None,
                source: RecordSource::Demo,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn corpus_is_fixed_and_ordered() {
        let corpus = demo_corpus();
        assert_eq!(corpus.len(), 8);
        let ids: Vec<&str> = corpus.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5", "6", "7", "8"]);
        assert_eq!(corpus, demo_corpus());
    }

    #[test]
    fn ids_are_unique_and_records_are_plain() {
        let corpus = demo_corpus();
        let ids: HashSet<&str> = corpus.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), corpus.len());
        assert!(corpus.iter().all(|r| r.source == RecordSource::Demo));
        assert!(corpus.iter().all(|r| !r.ai_enhanced && r.ai_summary.is_none()));
        assert!(corpus.iter().all(|r| r.wcag_compliant));
    }
}
