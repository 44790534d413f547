//! CSS Parser using lightningcss
//!
//! Parses a stylesheet and flattens it into one [`CssRule`] per selector
//! and declaration, in source order.

use judge_dom::Position;
use lightningcss::declaration::DeclarationBlock;
use lightningcss::properties::Property;
use lightningcss::rules::CssRule as LightningRule;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;

use crate::selectors::{Selector, split_selector_list};
use crate::{CssError, CssRule};

/// CSS Parser
pub struct CssParser;

impl CssParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a stylesheet into flattened rules
    pub fn parse(&self, css: &str) -> Result<Vec<CssRule>, CssError> {
        let stylesheet = StyleSheet::parse(css, ParserOptions::default()).map_err(|e| {
            CssError::Parse {
                message: e.kind.to_string(),
                position: e
                    .loc
                    .as_ref()
                    .map(|loc| Position::new(loc.line as usize, loc.column.saturating_sub(1) as usize)),
            }
        })?;

        let mut rules = Vec::new();
        for rule in stylesheet.rules.0.iter() {
            match rule {
                LightningRule::Style(style_rule) => {
                    let selectors = style_rule
                        .selectors
                        .to_css_string(PrinterOptions::default())
                        .map_err(|e| CssError::Parse { message: e.to_string(), position: None })?;
                    let position = Position::new(
                        style_rule.loc.line as usize,
                        style_rule.loc.column.saturating_sub(1) as usize,
                    );
                    self.convert_rule(&selectors, &style_rule.declarations, position, &mut rules)?;
                }
                // @media, @font-face, @keyframes, ... do not take part
                _ => tracing::debug!("skipping non-style rule"),
            }
        }

        tracing::debug!(rules = rules.len(), "parsed stylesheet");
        Ok(rules)
    }

    fn convert_rule(
        &self,
        selectors: &str,
        declarations: &DeclarationBlock<'_>,
        position: Position,
        out: &mut Vec<CssRule>,
    ) -> Result<(), CssError> {
        let converted: Vec<(String, String, bool)> = declarations
            .declarations
            .iter()
            .map(|d| (d, false))
            .chain(declarations.important_declarations.iter().map(|d| (d, true)))
            .map(|(d, important)| self.convert_declaration(d, important))
            .collect::<Result<_, _>>()?;

        for text in split_selector_list(selectors) {
            let selector = Selector::parse(text)?;
            let specificity = selector.specificity();
            for (property, value, important) in &converted {
                out.push(CssRule {
                    selector: selector.clone(),
                    property: property.clone(),
                    value: value.clone(),
                    important: *important,
                    specificity,
                    position,
                });
            }
        }
        Ok(())
    }

    fn convert_declaration(
        &self,
        property: &Property<'_>,
        important: bool,
    ) -> Result<(String, String, bool), CssError> {
        // Keeps the vendor prefix: `-webkit-box-shadow` is its own property
        let name = property
            .property_id()
            .to_css_string(PrinterOptions::default())
            .map_err(|e| CssError::Parse { message: e.to_string(), position: None })?
            .to_ascii_lowercase();
        let value = property
            .value_to_css_string(PrinterOptions::default())
            .map_err(|e| CssError::Parse { message: e.to_string(), position: None })?;
        Ok((name, value, important))
    }
}

impl Default for CssParser {
    fn default() -> Self {
        Self::new()
    }
}
