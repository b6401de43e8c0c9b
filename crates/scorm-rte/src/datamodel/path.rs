/// Placeholder standing in for a collection index in element patterns.
pub const INDEX_SEGMENT: &str = "n";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Children,
    Count,
}

/// One indexed step of a concrete path, e.g. the `3` in
/// `cmi.interactions.3.id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexLevel {
    /// Concrete collection path, e.g. `cmi.interactions.0.objectives`.
    pub collection: String,
    /// Collection pattern, e.g. `cmi.interactions.n.objectives`.
    pub collection_pattern: String,
    pub index: usize,
}

/// A dotted CMI path split into its pattern and indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementPath {
    raw: String,
    pattern: String,
    levels: Vec<IndexLevel>,
    keyword: Option<Keyword>,
}

impl ElementPath {
    /// Returns `None` for paths that can never name an element: empty
    /// segments, indices with leading zeros, keywords in the middle.
    pub fn parse(raw: &str) -> Option<Self> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return None;
        }

        let mut pattern_segments: Vec<&str> = Vec::with_capacity(segments.len());
        let mut levels = Vec::new();
        let mut keyword = None;
        for (position, segment) in segments.iter().enumerate() {
            let last = position + 1 == segments.len();
            match *segment {
                "_children" | "_count" if !last => return None,
                "_children" => keyword = Some(Keyword::Children),
                "_count" => keyword = Some(Keyword::Count),
                _ => {}
            }

            if segment.bytes().all(|byte| byte.is_ascii_digit()) {
                if position == 0 || (segment.len() > 1 && segment.starts_with('0')) {
                    return None;
                }
                // Digits only, so parsing fails on overflow alone. A saturated
                // index is past every collection's count.
                let index = segment.parse::<usize>().unwrap_or(usize::MAX);
                levels.push(IndexLevel {
                    collection: segments[..position].join("."),
                    collection_pattern: pattern_segments.join("."),
                    index,
                });
                pattern_segments.push(INDEX_SEGMENT);
            } else {
                pattern_segments.push(segment);
            }
        }

        Some(Self {
            raw: raw.to_string(),
            pattern: pattern_segments.join("."),
            levels,
            keyword,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn levels(&self) -> &[IndexLevel] {
        &self.levels
    }

    pub fn keyword(&self) -> Option<Keyword> {
        self.keyword
    }

    /// Pattern of the path a keyword applies to (`cmi.core` for
    /// `cmi.core._children`).
    pub fn keyword_target_pattern(&self) -> Option<&str> {
        self.keyword?;
        self.pattern.rsplit_once('.').map(|(target, _)| target)
    }

    /// Concrete path a keyword applies to.
    pub fn keyword_target(&self) -> Option<&str> {
        self.keyword?;
        self.raw.rsplit_once('.').map(|(target, _)| target)
    }

    /// Element part after the innermost index (`score.raw` for
    /// `cmi.objectives.2.score.raw`).
    pub fn field_in_entry(&self) -> Option<&str> {
        let level = self.levels.last()?;
        let entry = self.raw.get(level.collection.len() + 1..)?;
        entry.split_once('.').map(|(_, field)| field)
    }
}

/// Substitutes `indices` into the `n` placeholders of `pattern` in order.
pub fn instantiate(pattern: &str, indices: &[usize]) -> String {
    let mut remaining = indices.iter();
    pattern
        .split('.')
        .map(|segment| {
            if segment == INDEX_SEGMENT {
                remaining
                    .next()
                    .map(|index| index.to_string())
                    .unwrap_or_else(|| segment.to_string())
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
