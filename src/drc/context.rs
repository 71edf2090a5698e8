//! Shared state handed to every tester during one phase

use crate::board::Board;
use crate::geometry::{Coord, Point};
use crate::units::{message_text_from_value, EdaUnits};

use super::{ClearanceResolver, DrcErrorCode, DrcItem, Marker, RuleSet};

pub struct DrcContext<'a> {
    pub board: &'a Board,
    pub resolver: ClearanceResolver<'a>,
    pub units: EdaUnits,
    max_clearance: Coord,
    markers: Vec<Marker>,
}

impl<'a> DrcContext<'a> {
    pub fn new(board: &'a Board, rules: &'a RuleSet, units: EdaUnits) -> Self {
        let resolver = ClearanceResolver::new(board, rules);
        let max_clearance = resolver.max_clearance();
        Self { board, resolver, units, max_clearance, markers: Vec::new() }
    }

    pub fn is_ignored(&self, code: DrcErrorCode) -> bool {
        self.board.design_settings.is_ignored(code)
    }

    /// Record a marker unless its code is suppressed
    pub fn report(&mut self, marker: Marker) {
        if !self.is_ignored(marker.code()) {
            self.markers.push(marker);
        }
    }

    pub fn emit(&mut self, item: DrcItem, position: Point) {
        self.report(Marker::new(item, position));
    }

    pub fn format_value(&self, value: Coord) -> String {
        message_text_from_value(self.units, value)
    }

    /// `<error text> (<source> <min>; actual <actual>)`
    pub fn clearance_message(&self, code: DrcErrorCode, source: &str, min: Coord, actual: Coord) -> String {
        format!(
            "{} ({} {}; actual {})",
            code.error_text(),
            source,
            self.format_value(min),
            self.format_value(actual)
        )
    }

    /// `<error text> (board minimum <min>; actual <actual>)`
    pub fn floor_message(&self, code: DrcErrorCode, min: Coord, actual: Coord) -> String {
        self.clearance_message(code, "board minimum", min, actual)
    }

    /// Upper bound on clearances, used to inflate spatial queries
    pub fn max_clearance(&self) -> Coord {
        self.max_clearance
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn take_markers(&mut self) -> Vec<Marker> {
        std::mem::take(&mut self.markers)
    }
}
