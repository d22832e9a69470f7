//! Markdown reports over the whole roster.
//!
//! Output is a pure function of the registry and the [`ReportOptions`]; the
//! only clock input is the optional `generated_at` stamp.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::DramatisConfig;
use crate::network;
use crate::personality::{self, DEFAULT_DOMINANT_COUNT};
use crate::registry::Registry;
use crate::stats;
use crate::types::Character;

/// Message returned by [`format_network_report`] for fewer than two
/// characters.
pub const INSUFFICIENT_NETWORK_DATA: &str = "Insufficient data for network analysis.";

/// Layout knobs for [`format_report_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Stamp written under the title. `None` omits the line.
    pub generated_at: Option<DateTime<Utc>>,
    /// Append the network section after the distribution.
    pub include_network: bool,
    /// Names listed on each character's "Dominant Traits" line.
    pub dominant_trait_count: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            generated_at: None,
            include_network: false,
            dominant_trait_count: DEFAULT_DOMINANT_COUNT,
        }
    }
}

impl ReportOptions {
    /// Options taken from the `[report]` and `[analytics]` sections.
    #[must_use]
    pub fn from_config(config: &DramatisConfig) -> Self {
        Self {
            generated_at: None,
            include_network: config.report.include_network,
            dominant_trait_count: config.analytics.dominant_trait_count,
        }
    }

    /// Stamp the report with `at`.
    #[must_use]
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }
}

// ---------------------------------------------------------------------------
// Character report
// ---------------------------------------------------------------------------

/// Lazily rendered character report; see [`format_report_with`].
#[derive(Debug, Clone, Copy)]
pub struct RosterReport<'a> {
    registry: &'a Registry,
    options: &'a ReportOptions,
}

impl<'a> RosterReport<'a> {
    /// Bind a registry and options for rendering.
    #[must_use]
    pub fn new(registry: &'a Registry, options: &'a ReportOptions) -> Self {
        Self { registry, options }
    }

    fn write_character(&self, f: &mut fmt::Formatter<'_>, character: &Character) -> fmt::Result {
        writeln!(f, "### {}", character.name)?;
        writeln!(f, "**Role:** {}", or_placeholder(&character.role, "Unknown"))?;

        writeln!(f, "**Personality Traits:**")?;
        let ranked = personality::rank_traits(character);
        if ranked.is_empty() {
            writeln!(f, "- No traits defined")?;
        } else {
            for t in &ranked {
                writeln!(f, "- {}: {}/10", t.name, t.weight)?;
            }
            let dominant: Vec<&str> = ranked
                .iter()
                .take(self.options.dominant_trait_count)
                .map(|t| t.name.as_str())
                .collect();
            if !dominant.is_empty() {
                writeln!(f, "**Dominant Traits:** {}", dominant.join(", "))?;
            }
        }

        writeln!(f, "**Relationships:**")?;
        if character.relationships.is_empty() {
            writeln!(f, "- No relationships defined")?;
        }
        for rel in &character.relationships {
            if rel.notes.is_empty() {
                writeln!(f, "- {} ({})", rel.target, rel.kind)?;
            } else {
                writeln!(f, "- {} ({}): {}", rel.target, rel.kind, rel.notes)?;
            }
        }

        writeln!(f, "**Notes:** {}", or_placeholder(&character.notes, "None"))?;
        writeln!(f)
    }

    fn write_distribution(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.registry.len();
        writeln!(f, "## Personality Distribution")?;
        writeln!(f)?;
        writeln!(f, "**Total Characters:** {total}")?;
        writeln!(f, "**Personality Traits Distribution:**")?;
        for (name, count) in personality::trait_frequency(self.registry) {
            let share = stats::percentage(count as u64, total as u64);
            writeln!(f, "- {name}: {count} characters ({share:.1}%)")?;
        }
        Ok(())
    }
}

impl fmt::Display for RosterReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Character Analysis Report")?;
        writeln!(f)?;
        if let Some(at) = self.options.generated_at {
            writeln!(f, "*Generated: {}*", at.to_rfc3339_opts(SecondsFormat::Secs, true))?;
            writeln!(f)?;
        }

        for character in self.registry {
            self.write_character(f, character)?;
        }
        self.write_distribution(f)?;

        if self.options.include_network {
            writeln!(f)?;
            write!(f, "{}", NetworkSection(self.registry))?;
        }
        Ok(())
    }
}

fn or_placeholder<'s>(value: &'s str, placeholder: &'s str) -> &'s str {
    if value.is_empty() { placeholder } else { value }
}

/// The character report with default options.
#[must_use]
pub fn format_report(registry: &Registry) -> String {
    format_report_with(registry, &ReportOptions::default())
}

/// The character report: one section per character in registry order,
/// then the trait distribution, then (optionally) the network analysis.
#[must_use]
pub fn format_report_with(registry: &Registry, options: &ReportOptions) -> String {
    RosterReport::new(registry, options).to_string()
}

// ---------------------------------------------------------------------------
// Network report
// ---------------------------------------------------------------------------

struct NetworkSection<'a>(&'a Registry);

impl fmt::Display for NetworkSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.0;
        if registry.len() < 2 {
            return writeln!(f, "{INSUFFICIENT_NETWORK_DATA}");
        }
        let report = network::network_report(registry);

        writeln!(f, "## Relationship Network Analysis")?;
        writeln!(f)?;
        writeln!(f, "**Network Overview:**")?;
        writeln!(f, "- Total Characters: {}", report.total_characters)?;
        writeln!(f, "- Total Relationships: {}", report.total_relationships)?;
        writeln!(f, "- Resolved Relationships: {}", report.resolved_relationships)?;
        writeln!(f, "- Network Density: {:.3}", report.density)?;
        writeln!(f)?;

        writeln!(f, "**Relationship Type Distribution:**")?;
        for (kind, count) in &report.relationship_types {
            let share = stats::percentage(*count as u64, report.total_relationships as u64);
            writeln!(f, "- {}: {count} ({share:.1}%)", kind.label())?;
        }

        if !report.mutual.is_empty() {
            writeln!(f)?;
            writeln!(f, "**Mutual Relationships:**")?;
            for m in &report.mutual {
                writeln!(f, "- {} ↔ {} ({}/{})", m.character_a, m.character_b, m.type_a, m.type_b)?;
            }
        }

        if !report.isolated.is_empty() {
            writeln!(f)?;
            writeln!(f, "**Isolated Characters:**")?;
            for name in &report.isolated {
                writeln!(f, "- {name}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "**Network Insights:**")?;
        writeln!(f, "- {}", report.density_insight.description())
    }
}

/// The network analysis as Markdown, or [`INSUFFICIENT_NETWORK_DATA`] when
/// the roster has fewer than two characters.
#[must_use]
pub fn format_network_report(registry: &Registry) -> String {
    if registry.len() < 2 {
        return INSUFFICIENT_NETWORK_DATA.to_string();
    }
    NetworkSection(registry).to_string()
}
