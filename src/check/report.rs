//! Check report types for structured issue reporting.

use std::fmt;

/// The result of checking a manifest.
#[derive(Clone, Debug, Default)]
pub struct CheckReport {
    /// All issues found, in discovery order.
    pub issues: Vec<CheckIssue>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn add(&mut self, issue: CheckIssue) {
        self.issues.push(issue);
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Check passed: no issues found");
        }

        writeln!(
            f,
            "Check completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single check issue (error or warning).
#[derive(Clone, Debug)]
pub struct CheckIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub context: IssueContext,
}

impl CheckIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for CheckIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// The severity of a check issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Suspicious but usable data.
    Warning,
    /// Invalid or corrupt data.
    Error,
}

/// A stable code identifying the type of check issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    // ID uniqueness
    /// Multiple images share an id.
    DuplicateImageId,
    /// Multiple annotations share an id.
    DuplicateAnnotationId,
    /// Multiple categories share an id.
    DuplicateCategoryId,

    // References
    /// An annotation references an image id not present in `images[]`.
    MissingImageRef,
    /// An annotation references a category id not present in `categories[]`.
    MissingCategoryRef,

    // Images
    /// An image has zero width or height.
    InvalidImageDimensions,
    /// An image has an empty file name.
    EmptyFileName,

    // Categories
    /// A category has an empty name.
    EmptyCategoryName,
    /// Multiple categories share a name.
    DuplicateCategoryName,

    // Annotations
    /// An annotation has no bounding box.
    MissingBBox,
    /// A bounding box has non-finite components.
    BBoxNotFinite,
    /// A bounding box has negative origin or size.
    NegativeBBox,
    /// A bounding box extends outside the image bounds.
    BBoxOutOfBounds,
    /// A bounding box has zero area.
    ZeroAreaBBox,
    /// Stored area disagrees with width * height.
    AreaMismatch,
    /// An annotation is labeled with the reserved background category.
    BackgroundAnnotation,
}

/// Context about where a check issue occurred.
#[derive(Clone, Debug)]
pub enum IssueContext {
    Manifest,
    Image { id: u64 },
    Annotation { id: u64 },
    Category { id: u64 },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Manifest => write!(f, "manifest"),
            IssueContext::Image { id } => write!(f, "image {}", id),
            IssueContext::Annotation { id } => write!(f, "annotation {}", id),
            IssueContext::Category { id } => write!(f, "category {}", id),
        }
    }
}
