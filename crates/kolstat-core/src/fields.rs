//! Performance-field selection model.
//!
//! The platform exposes note-performance analytics along three axes: note
//! business (daily vs cooperation), note kind (image, video, or both) and
//! date window (30 or 90 days). Each of the twelve combinations maps
//! deterministically to one set of request parameters and one stable
//! field-name prefix. A selection is fixed for the duration of a run.

use crate::CoreError;

/// Note business category: organic daily notes or paid cooperation notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Business {
    Daily,
    Coop,
}

impl Business {
    /// Numeric flag the platform expects in query strings.
    #[must_use]
    pub fn flag(self) -> u8 {
        match self {
            Business::Daily => 0,
            Business::Coop => 1,
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Business::Daily => "daily",
            Business::Coop => "coop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    Image,
    Video,
    Mixed,
}

impl NoteKind {
    #[must_use]
    pub fn flag(self) -> u8 {
        match self {
            NoteKind::Image => 1,
            NoteKind::Video => 2,
            NoteKind::Mixed => 3,
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            NoteKind::Image => "image",
            NoteKind::Video => "video",
            NoteKind::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateRange {
    Last30,
    Last90,
}

impl DateRange {
    #[must_use]
    pub fn flag(self) -> u8 {
        match self {
            DateRange::Last30 => 1,
            DateRange::Last90 => 2,
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            DateRange::Last30 => "d30",
            DateRange::Last90 => "d90",
        }
    }
}

/// One performance-analytics variant: a point in the business × kind × range grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PerfVariant {
    pub business: Business,
    pub note_kind: NoteKind,
    pub date_range: DateRange,
}

/// Request parameters a variant expands to. `advertise_switch` is always 1
/// (all-traffic view); the platform has no other mode worth collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantParams {
    pub business: u8,
    pub note_type: u8,
    pub date_type: u8,
    pub advertise_switch: u8,
}

impl PerfVariant {
    /// Every collectable variant, in the order they appear in exports.
    pub const ALL: [PerfVariant; 12] = {
        const fn v(business: Business, note_kind: NoteKind, date_range: DateRange) -> PerfVariant {
            PerfVariant {
                business,
                note_kind,
                date_range,
            }
        }
        [
            v(Business::Daily, NoteKind::Mixed, DateRange::Last30),
            v(Business::Daily, NoteKind::Image, DateRange::Last30),
            v(Business::Daily, NoteKind::Video, DateRange::Last30),
            v(Business::Daily, NoteKind::Mixed, DateRange::Last90),
            v(Business::Daily, NoteKind::Image, DateRange::Last90),
            v(Business::Daily, NoteKind::Video, DateRange::Last90),
            v(Business::Coop, NoteKind::Mixed, DateRange::Last30),
            v(Business::Coop, NoteKind::Image, DateRange::Last30),
            v(Business::Coop, NoteKind::Video, DateRange::Last30),
            v(Business::Coop, NoteKind::Mixed, DateRange::Last90),
            v(Business::Coop, NoteKind::Image, DateRange::Last90),
            v(Business::Coop, NoteKind::Video, DateRange::Last90),
        ]
    };

    #[must_use]
    pub fn params(&self) -> VariantParams {
        VariantParams {
            business: self.business.flag(),
            note_type: self.note_kind.flag(),
            date_type: self.date_range.flag(),
            advertise_switch: 1,
        }
    }

    /// Stable human-facing label, e.g. `daily-image-d30`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}-{}-{}",
            self.business.key(),
            self.note_kind.key(),
            self.date_range.key()
        )
    }

    /// Field-name prefix owned by this variant, e.g. `perf.daily.image.d30.`.
    /// Prefixes are disjoint across variants, which is what makes result
    /// merging collision-free by construction.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!(
            "perf.{}.{}.{}.",
            self.business.key(),
            self.note_kind.key(),
            self.date_range.key()
        )
    }

    /// Parses a label produced by [`PerfVariant::label`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] for anything that is not one of
    /// the twelve known labels.
    pub fn parse(label: &str) -> Result<Self, CoreError> {
        Self::ALL
            .iter()
            .find(|v| v.label() == label)
            .copied()
            .ok_or_else(|| CoreError::UnknownField(label.to_string()))
    }
}

/// Ordered, de-duplicated set of performance variants for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    variants: Vec<PerfVariant>,
}

impl FieldSelection {
    /// Selection covering every variant.
    #[must_use]
    pub fn all() -> Self {
        Self {
            variants: PerfVariant::ALL.to_vec(),
        }
    }

    /// Empty selection: performance analytics are skipped entirely.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds a selection from stored labels, preserving order and dropping
    /// duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] on the first unrecognized label.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut variants: Vec<PerfVariant> = Vec::new();
        for label in labels {
            let variant = PerfVariant::parse(label.as_ref())?;
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }
        Ok(Self { variants })
    }

    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.variants.iter().map(PerfVariant::label).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PerfVariant> {
        self.variants.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }
}
