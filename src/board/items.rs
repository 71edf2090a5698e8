//! Board item variants: tracks and vias, pads, footprints, zones, graphics and texts

use serde::{Deserialize, Serialize};

use super::{BoardItem, ItemId, ItemKind, LayerId, LayerSet};
use crate::geometry::{
    build_closed_contours, flatten_arc, flatten_bezier, flatten_circle, BBox, Coord, Point,
    PolySet, Seg, ARC_HIGH_DEF, CHAINING_EPSILON,
};

fn default_true() -> bool {
    true
}

// ═══════════════════════════════════════════════════════════════════════════
// TRACKS AND VIAS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViaType {
    #[default]
    Through,
    BlindBuried,
    Micro,
}

/// Via-specific attributes; the via's top layer is the track layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaAttrs {
    #[serde(default)]
    pub via_type: ViaType,
    pub drill: Coord,
    pub bottom_layer: LayerId,
}

/// A copper track segment, or a via when `via` is set
///
/// For vias `start == end` is the via centre and `width` is the pad diameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: ItemId,
    pub start: Point,
    #[serde(default)]
    pub end: Point,
    pub width: Coord,
    pub layer: LayerId,
    #[serde(default)]
    pub net: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<ViaAttrs>,
}

impl Track {
    pub fn segment(id: u64, start: Point, end: Point, width: Coord, layer: LayerId, net: i32) -> Self {
        Self { id: ItemId(id), start, end, width, layer, net, via: None }
    }

    pub fn new_via(
        id: u64,
        position: Point,
        diameter: Coord,
        drill: Coord,
        top: LayerId,
        bottom: LayerId,
        net: i32,
    ) -> Self {
        Self {
            id: ItemId(id),
            start: position,
            end: position,
            width: diameter,
            layer: top,
            net,
            via: Some(ViaAttrs { via_type: ViaType::Through, drill, bottom_layer: bottom }),
        }
    }

    pub fn is_via(&self) -> bool {
        self.via.is_some()
    }

    pub fn seg(&self) -> Seg {
        Seg::new(self.start, self.end)
    }

    pub fn bbox(&self) -> BBox {
        self.seg().bbox().inflated(self.width / 2)
    }
}

impl BoardItem for Track {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        if self.is_via() {
            ItemKind::Via
        } else {
            ItemKind::Track
        }
    }

    fn layers(&self) -> LayerSet {
        match &self.via {
            Some(v) => LayerSet::copper_span(self.layer, v.bottom_layer),
            None => LayerSet::single(self.layer),
        }
    }

    fn net_code(&self) -> Option<i32> {
        Some(self.net)
    }

    fn position(&self) -> Point {
        self.start
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PADS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: Coord,
    pub height: Coord,
}

impl Size {
    pub const fn new(width: Coord, height: Coord) -> Self {
        Self { width, height }
    }

    pub fn min(&self) -> Coord {
        self.width.min(self.height)
    }

    pub fn max(&self) -> Coord {
        self.width.max(self.height)
    }
}

fn default_round_ratio() -> f64 {
    0.25
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PadShape {
    Circle,
    Rect,
    Oval,
    RoundRect {
        #[serde(default = "default_round_ratio")]
        radius_ratio: f64,
    },
    /// Outline relative to the pad position, before rotation
    Custom { outline: Vec<Point> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillShape {
    #[default]
    Circle,
    Oval,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadAttribute {
    #[default]
    Smd,
    Pth,
    Npth,
    Conn,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    pub position: Point,
    /// Shape offset from the hole, rotated with the pad
    #[serde(default)]
    pub offset: Point,
    pub shape: PadShape,
    pub size: Size,
    /// Degrees, counter-clockwise
    #[serde(default)]
    pub orientation: f64,
    #[serde(default)]
    pub drill: Size,
    #[serde(default)]
    pub drill_shape: DrillShape,
    pub layers: LayerSet,
    #[serde(default)]
    pub net: i32,
    #[serde(default)]
    pub local_clearance: Coord,
    #[serde(default)]
    pub attribute: PadAttribute,
    #[serde(skip)]
    pub parent: Option<ItemId>,
}

impl Pad {
    pub fn new(id: u64, name: &str, position: Point, shape: PadShape, size: Size, layers: LayerSet) -> Self {
        Self {
            id: ItemId(id),
            name: name.to_string(),
            position,
            offset: Point::default(),
            shape,
            size,
            orientation: 0.0,
            drill: Size::default(),
            drill_shape: DrillShape::Circle,
            layers,
            net: 0,
            local_clearance: 0,
            attribute: PadAttribute::Smd,
            parent: None,
        }
    }

    /// Centre of the copper shape (position plus rotated offset)
    pub fn shape_position(&self) -> Point {
        self.position + self.offset.rotated(self.orientation)
    }

    pub fn has_hole(&self) -> bool {
        self.drill.width > 0
    }

    /// Smallest hole dimension
    pub fn drill_min(&self) -> Coord {
        match self.drill_shape {
            DrillShape::Circle => self.drill.width,
            DrillShape::Oval if self.drill.height > 0 => self.drill.min(),
            DrillShape::Oval => self.drill.width,
        }
    }
}

impl BoardItem for Pad {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Pad
    }

    fn layers(&self) -> LayerSet {
        self.layers
    }

    fn net_code(&self) -> Option<i32> {
        Some(self.net)
    }

    fn local_clearance(&self) -> Coord {
        self.local_clearance
    }

    fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    fn position(&self) -> Point {
        self.position
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// GRAPHICS AND TEXTS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum GraphicShape {
    Segment { start: Point, end: Point },
    /// Arc from `start` sweeping `angle` degrees around `center`
    Arc { center: Point, start: Point, angle: f64 },
    Circle { center: Point, radius: Coord },
    Bezier { start: Point, control1: Point, control2: Point, end: Point },
    Polygon { points: Vec<Point> },
}

/// A drawn line, arc, circle, curve or polygon
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Graphic {
    pub id: ItemId,
    pub layer: LayerId,
    #[serde(default)]
    pub width: Coord,
    #[serde(flatten)]
    pub shape: GraphicShape,
    #[serde(skip)]
    pub parent: Option<ItemId>,
}

impl Graphic {
    pub fn new(id: u64, layer: LayerId, width: Coord, shape: GraphicShape) -> Self {
        Self { id: ItemId(id), layer, width, shape, parent: None }
    }

    /// Flattened outline as (open polylines, closed rings)
    pub fn outline_pieces(&self) -> (Vec<Vec<Point>>, Vec<Vec<Point>>) {
        match &self.shape {
            GraphicShape::Segment { start, end } => (vec![vec![*start, *end]], Vec::new()),
            GraphicShape::Arc { center, start, angle } => {
                (vec![flatten_arc(*center, *start, *angle, ARC_HIGH_DEF)], Vec::new())
            }
            GraphicShape::Bezier { start, control1, control2, end } => (
                vec![flatten_bezier(*start, *control1, *control2, *end, self.width.max(ARC_HIGH_DEF))],
                Vec::new(),
            ),
            GraphicShape::Circle { center, radius } => {
                (Vec::new(), vec![flatten_circle(*center, *radius, ARC_HIGH_DEF)])
            }
            GraphicShape::Polygon { points } => (Vec::new(), vec![points.clone()]),
        }
    }

    /// Flattened centre-line segments
    pub fn segments(&self) -> Vec<Seg> {
        let (open, closed) = self.outline_pieces();
        let mut segs = Vec::new();
        for line in &open {
            segs.extend(line.windows(2).map(|w| Seg::new(w[0], w[1])));
        }
        for ring in &closed {
            let n = ring.len();
            segs.extend((0..n).map(|i| Seg::new(ring[i], ring[(i + 1) % n])));
        }
        segs
    }

    pub fn bbox(&self) -> BBox {
        let (open, closed) = self.outline_pieces();
        BBox::from_points(open.iter().chain(closed.iter()).flatten().copied())
            .unwrap_or(BBox::from_point(self.position()))
            .inflated(self.width / 2)
    }
}

impl BoardItem for Graphic {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Graphic
    }

    fn layers(&self) -> LayerSet {
        LayerSet::single(self.layer)
    }

    fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    fn position(&self) -> Point {
        match &self.shape {
            GraphicShape::Segment { start, .. } => *start,
            GraphicShape::Arc { center, .. } => *center,
            GraphicShape::Circle { center, .. } => *center,
            GraphicShape::Bezier { start, .. } => *start,
            GraphicShape::Polygon { points } => points.first().copied().unwrap_or_default(),
        }
    }
}

/// A text item with its glyphs already stroked into segments
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub id: ItemId,
    #[serde(default)]
    pub text: String,
    pub position: Point,
    pub layer: LayerId,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub pen_width: Coord,
    #[serde(default)]
    pub strokes: Vec<Seg>,
    #[serde(skip)]
    pub parent: Option<ItemId>,
}

impl Text {
    pub fn new(id: u64, text: &str, position: Point, layer: LayerId) -> Self {
        Self {
            id: ItemId(id),
            text: text.to_string(),
            position,
            layer,
            visible: true,
            pen_width: 0,
            strokes: Vec::new(),
            parent: None,
        }
    }

    pub fn bbox(&self) -> BBox {
        BBox::from_points(self.strokes.iter().flat_map(|s| [s.a, s.b]))
            .unwrap_or(BBox::from_point(self.position))
            .inflated(self.pen_width / 2)
    }

    /// Text with `${VAR}` references expanded; unknown variables are left as written
    pub fn shown_text<F>(&self, resolve: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        expand_text_vars(&self.text, resolve)
    }
}

impl BoardItem for Text {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Text
    }

    fn layers(&self) -> LayerSet {
        LayerSet::single(self.layer)
    }

    fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    fn position(&self) -> Point {
        self.position
    }
}

pub fn expand_text_vars<F>(source: &str, resolve: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match resolve(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Board-level drawing: a graphic or a text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Drawing {
    Graphic(Graphic),
    Text(Text),
}

impl Drawing {
    pub fn as_item(&self) -> &dyn BoardItem {
        match self {
            Drawing::Graphic(g) => g,
            Drawing::Text(t) => t,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ZONES
// ═══════════════════════════════════════════════════════════════════════════

/// What a keepout area forbids
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepoutRules {
    pub no_tracks: bool,
    pub no_vias: bool,
    pub no_pads: bool,
    pub no_footprints: bool,
    pub no_copper_pour: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CornerSmoothing {
    #[default]
    None,
    Chamfer { distance: Coord },
    Fillet { radius: Coord },
}

/// A copper zone or, when `keepout` is set, a keepout area
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub net: i32,
    pub layers: LayerSet,
    pub outline: PolySet,
    #[serde(default)]
    pub priority: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepout: Option<KeepoutRules>,
    #[serde(default)]
    pub smoothing: CornerSmoothing,
    #[serde(default)]
    pub is_filled: bool,
    #[serde(default)]
    pub filled_polys: PolySet,
    #[serde(default)]
    pub local_clearance: Coord,
    #[serde(skip)]
    pub parent: Option<ItemId>,
}

impl Zone {
    pub fn new(id: u64, layers: LayerSet, outline: Vec<Point>, net: i32) -> Self {
        Self {
            id: ItemId(id),
            name: String::new(),
            net,
            layers,
            outline: PolySet::from_outline(outline),
            priority: 0,
            keepout: None,
            smoothing: CornerSmoothing::None,
            is_filled: false,
            filled_polys: PolySet::default(),
            local_clearance: 0,
            parent: None,
        }
    }

    pub fn new_keepout(id: u64, layers: LayerSet, outline: Vec<Point>, rules: KeepoutRules) -> Self {
        Self { keepout: Some(rules), ..Zone::new(id, layers, outline, 0) }
    }

    pub fn is_keepout(&self) -> bool {
        self.keepout.is_some()
    }

    pub fn is_on_copper_layer(&self) -> bool {
        !self.layers.copper().is_empty()
    }

    pub fn keepout_rules(&self) -> KeepoutRules {
        self.keepout.unwrap_or_default()
    }

    /// Outline with corner smoothing applied
    pub fn smoothed_outline(&self) -> PolySet {
        match self.smoothing {
            CornerSmoothing::None => self.outline.clone(),
            CornerSmoothing::Chamfer { distance } if distance > 0 => self.outline.chamfered(distance),
            CornerSmoothing::Fillet { radius } if radius > 0 => self.outline.filleted(radius, ARC_HIGH_DEF),
            _ => self.outline.clone(),
        }
    }

    /// Area other items conflict with: the fill when filled, else the outline
    pub fn conflict_outline(&self) -> &PolySet {
        if self.is_filled {
            &self.filled_polys
        } else {
            &self.outline
        }
    }

    pub fn bbox(&self) -> BBox {
        self.outline
            .bbox()
            .unwrap_or(BBox::from_point(Point::default()))
    }
}

impl BoardItem for Zone {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        if self.is_keepout() {
            ItemKind::Keepout
        } else {
            ItemKind::Zone
        }
    }

    fn layers(&self) -> LayerSet {
        self.layers
    }

    fn net_code(&self) -> Option<i32> {
        Some(self.net)
    }

    fn local_clearance(&self) -> Coord {
        self.local_clearance
    }

    fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    /// First outline corner
    fn position(&self) -> Point {
        self.outline.vertices().next().unwrap_or_default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FOOTPRINTS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardSide {
    Front,
    Back,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub id: ItemId,
    pub reference: Text,
    pub value: Text,
    pub position: Point,
    #[serde(default)]
    pub orientation: f64,
    /// Placed on the back side
    #[serde(default)]
    pub flipped: bool,
    #[serde(default)]
    pub pads: Vec<Pad>,
    #[serde(default)]
    pub graphics: Vec<Graphic>,
    #[serde(default)]
    pub texts: Vec<Text>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub local_clearance: Coord,
    /// Net-tie footprints may short nets through their own graphics
    #[serde(default)]
    pub net_tie: bool,
}

impl Footprint {
    pub fn new(id: u64, reference: Text, value: Text, position: Point) -> Self {
        let mut fp = Self {
            id: ItemId(id),
            reference,
            value,
            position,
            orientation: 0.0,
            flipped: false,
            pads: Vec::new(),
            graphics: Vec::new(),
            texts: Vec::new(),
            zones: Vec::new(),
            local_clearance: 0,
            net_tie: false,
        };
        fp.link_children();
        fp
    }

    pub fn add_pad(&mut self, mut pad: Pad) {
        pad.parent = Some(self.id);
        self.pads.push(pad);
    }

    pub fn add_graphic(&mut self, mut graphic: Graphic) {
        graphic.parent = Some(self.id);
        self.graphics.push(graphic);
    }

    pub fn add_zone(&mut self, mut zone: Zone) {
        zone.parent = Some(self.id);
        self.zones.push(zone);
    }

    /// Point every child's parent handle at this footprint
    pub fn link_children(&mut self) {
        let id = Some(self.id);
        self.reference.parent = id;
        self.value.parent = id;
        self.pads.iter_mut().for_each(|p| p.parent = id);
        self.graphics.iter_mut().for_each(|g| g.parent = id);
        self.texts.iter_mut().for_each(|t| t.parent = id);
        self.zones.iter_mut().for_each(|z| z.parent = id);
    }

    pub fn reference_str(&self) -> &str {
        &self.reference.text
    }

    pub fn value_str(&self) -> &str {
        &self.value.text
    }

    /// Reference, value, then the other texts
    pub fn all_texts(&self) -> impl Iterator<Item = &Text> {
        [&self.reference, &self.value].into_iter().chain(self.texts.iter())
    }

    /// Bounds of pads and graphics (texts excluded)
    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::from_point(self.position);
        for pad in &self.pads {
            let r = pad.size.max() / 2 + pad.offset.x.abs().max(pad.offset.y.abs());
            bbox.merge(&BBox::from_point(pad.position).inflated(r));
        }
        for g in &self.graphics {
            bbox.merge(&g.bbox());
        }
        bbox
    }

    /// Bounding box as a polygon, used when no courtyard is drawn
    pub fn bounding_poly(&self) -> PolySet {
        PolySet::from_outline(self.bbox().corners().to_vec())
    }

    /// Courtyard polygon for one side; `Ok` with an empty set when none is drawn
    ///
    /// Fails with the location of the first gap when the courtyard lines do
    /// not form closed shapes.
    pub fn courtyard(&self, side: BoardSide) -> Result<PolySet, Point> {
        let layer = match side {
            BoardSide::Front => LayerId::F_CRTYD,
            BoardSide::Back => LayerId::B_CRTYD,
        };
        let mut open = Vec::new();
        let mut closed = Vec::new();
        for g in self.graphics.iter().filter(|g| g.layer == layer) {
            let (o, c) = g.outline_pieces();
            open.extend(o);
            closed.extend(c);
        }
        if open.is_empty() && closed.is_empty() {
            return Ok(PolySet::default());
        }
        build_closed_contours(&open, &closed, CHAINING_EPSILON)
    }
}

impl BoardItem for Footprint {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Footprint
    }

    fn layers(&self) -> LayerSet {
        if self.flipped {
            LayerSet::single(LayerId::B_CU)
        } else {
            LayerSet::single(LayerId::F_CU)
        }
    }

    fn local_clearance(&self) -> Coord {
        self.local_clearance
    }

    fn position(&self) -> Point {
        self.position
    }
}
