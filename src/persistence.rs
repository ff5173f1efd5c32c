use std::path::Path;

use ahash::AHashSet;
use egui::{Pos2, Vec2};
use itertools::Itertools as _;

use crate::floating::{FloatingContainer, FloatingManager};
use crate::host::DockHost;
use crate::pane::{DockEdge, Pane, PaneId, PaneState};
use crate::surface::DockingSurface;
use crate::tree::{CompositionNode, CompositionTree, NodeId, Orientation, Split, SplitChild};

pub const LAYOUT_DOCUMENT_VERSION: u32 = 1;

/// Where in a [`LayoutDocument`] something went wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodePath {
    /// Child indices from the root `Child` element down.
    Tree(Vec<usize>),

    /// Index into `FloatingPanes`.
    Floating(usize),
}

impl NodePath {
    fn child(&self, index: usize) -> Self {
        match self {
            Self::Tree(indices) => {
                let mut indices = indices.clone();
                indices.push(index);
                Self::Tree(indices)
            }
            Self::Floating(_) => self.clone(),
        }
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tree(indices) => {
                write!(f, "/Child")?;
                for index in indices {
                    write!(f, "/{index}")?;
                }
                Ok(())
            }
            Self::Floating(index) => write!(f, "/FloatingPanes/{index}"),
        }
    }
}

#[derive(Debug)]
pub enum LayoutError {
    UnsupportedVersion { found: u32, expected: u32 },
    InvalidSpaceFactor { path: NodePath, value: f64 },
    InvalidSize { path: NodePath, field: &'static str },
    MissingPane { path: NodePath },
    MissingChildren { path: NodePath },
    InvalidState { path: NodePath, state: PersistedState },
    DuplicatePane { path: NodePath, pane: u64 },
    UnresolvedContent { path: NodePath, key: String },
    RonSerialize(ron::Error),
    RonDeserialize(ron::error::SpannedError),
    Io(std::io::Error),
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedVersion { found, expected } => {
                write!(
                    f,
                    "unsupported layout document version: {found} (expected {expected})"
                )
            }
            Self::InvalidSpaceFactor { path, value } => {
                write!(f, "{path}: space factor {value} is not in (0, 1]")
            }
            Self::InvalidSize { path, field } => write!(f, "{path}: invalid {field}"),
            Self::MissingPane { path } => write!(f, "{path}: terminal without a DockablePane"),
            Self::MissingChildren { path } => write!(f, "{path}: split without ChildGroups"),
            Self::InvalidState { path, state } => write!(f, "{path}: state {state:?} not allowed here"),
            Self::DuplicatePane { path, pane } => write!(f, "{path}: pane id {pane} used twice"),
            Self::UnresolvedContent { path, key } => {
                write!(f, "{path}: no content for key {key:?}")
            }
            Self::RonSerialize(err) => write!(f, "ron serialize error: {err}"),
            Self::RonDeserialize(err) => write!(f, "ron deserialize error: {err}"),
            Self::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RonSerialize(err) => Some(err),
            Self::RonDeserialize(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LayoutError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ron::Error> for LayoutError {
    fn from(err: ron::Error) -> Self {
        Self::RonSerialize(err)
    }
}

impl From<ron::error::SpannedError> for LayoutError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::RonDeserialize(err)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum ChildType {
    Terminal,
    Horizontal,
    Vertical,
}

/// Lifecycle state as stored in a document.
///
/// `FloatingWindow` is read as a floating pane but never written; floating panes are saved as
/// `DockableWindow`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum PersistedState {
    Hidden,
    Docked,
    FloatingWindow,
    DockableWindow,
}

impl PersistedState {
    fn from_state(state: PaneState) -> Self {
        match state {
            PaneState::Hidden => Self::Hidden,
            PaneState::Docked => Self::Docked,
            PaneState::Floating => Self::DockableWindow,
        }
    }

    fn to_state(self) -> PaneState {
        match self {
            Self::Hidden => PaneState::Hidden,
            Self::Docked => PaneState::Docked,
            Self::FloatingWindow | Self::DockableWindow => PaneState::Floating,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DockablePaneElement {
    #[serde(rename = "Id")]
    pub id: u64,

    #[serde(rename = "Size")]
    pub size: Vec2,

    #[serde(rename = "Dock")]
    pub dock: DockEdge,

    #[serde(rename = "State")]
    pub state: PersistedState,

    #[serde(rename = "FloatingPosition")]
    pub floating_position: Pos2,

    #[serde(rename = "FloatingSize")]
    pub floating_size: Vec2,

    /// Content-type key, resolved through a [`ContentFactory`].
    #[serde(rename = "Content")]
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ChildElement {
    #[serde(rename = "Type")]
    pub kind: ChildType,

    #[serde(rename = "SpaceFactor")]
    pub space_factor: f64,

    #[serde(rename = "DockablePane", default, skip_serializing_if = "Option::is_none")]
    pub pane: Option<DockablePaneElement>,

    #[serde(rename = "ChildGroups", default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ChildElement>>,
}

/// Persisted form of a [`DockingSurface`].
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LayoutDocument {
    #[serde(rename = "Version")]
    pub version: u32,

    /// The composition tree; absent when nothing is docked.
    #[serde(rename = "Child", default, skip_serializing_if = "Option::is_none")]
    pub child: Option<ChildElement>,

    /// Floating panes back to front, then hidden panes.
    #[serde(rename = "FloatingPanes", default)]
    pub floating_panes: Vec<DockablePaneElement>,
}

/// Maps pane content to and from the key stored in a [`LayoutDocument`].
///
/// Documents only store the key; the application decides how to rebuild content from it.
pub trait ContentFactory<C> {
    fn content_key(&mut self, content: &C) -> String;

    /// Return `None` if the key is unknown. The whole load then fails.
    fn resolve_content(&mut self, key: &str) -> Option<C>;
}

/// Convenience helper: build a [`ContentFactory`] from two closures.
pub struct SimpleContentFactory<ToKey, FromKey> {
    pub to_key: ToKey,
    pub from_key: FromKey,
}

impl<ToKey, FromKey> SimpleContentFactory<ToKey, FromKey> {
    pub fn new(to_key: ToKey, from_key: FromKey) -> Self {
        Self { to_key, from_key }
    }
}

impl<C, ToKey, FromKey> ContentFactory<C> for SimpleContentFactory<ToKey, FromKey>
where
    ToKey: FnMut(&C) -> String,
    FromKey: FnMut(&str) -> Option<C>,
{
    fn content_key(&mut self, content: &C) -> String {
        (self.to_key)(content)
    }

    fn resolve_content(&mut self, key: &str) -> Option<C> {
        (self.from_key)(key)
    }
}

fn pretty_ron_config() -> ron::ser::PrettyConfig {
    ron::ser::PrettyConfig::new()
        .depth_limit(128)
        .separate_tuple_members(true)
        .enumerate_arrays(true)
}

fn pane_element<C, F>(pane: &Pane<C>, factory: &mut F) -> DockablePaneElement
where
    F: ContentFactory<C>,
{
    DockablePaneElement {
        id: pane.id().get(),
        size: pane.size,
        dock: pane.dock_edge(),
        state: PersistedState::from_state(pane.state()),
        floating_position: pane.floating_position,
        floating_size: pane.floating_size,
        content: factory.content_key(&pane.content),
    }
}

fn child_element<C, F>(
    tree: &CompositionTree<C>,
    node: NodeId,
    space_factor: f64,
    factory: &mut F,
) -> Option<ChildElement>
where
    F: ContentFactory<C>,
{
    Some(match tree.get(node)? {
        CompositionNode::Terminal(pane) => ChildElement {
            kind: ChildType::Terminal,
            space_factor,
            pane: Some(pane_element(pane, factory)),
            children: None,
        },
        CompositionNode::Split(split) => ChildElement {
            kind: match split.orientation {
                Orientation::Horizontal => ChildType::Horizontal,
                Orientation::Vertical => ChildType::Vertical,
            },
            space_factor,
            pane: None,
            children: Some(
                split
                    .children
                    .iter()
                    .filter_map(|c| child_element(tree, c.node, c.factor, factory))
                    .collect(),
            ),
        },
    })
}

/// Everything a document describes, built off to the side before it replaces anything.
struct LoadedLayout<C> {
    tree: CompositionTree<C>,
    floating: FloatingManager<C>,
    hidden: Vec<Pane<C>>,
}

struct Loader<'a, F, H: ?Sized> {
    factory: &'a mut F,
    host: &'a mut H,
    seen: AHashSet<u64>,
    default_floating_size: Vec2,
}

impl<F, H: ?Sized> Loader<'_, F, H> {
    fn pane<C>(
        &mut self,
        element: &DockablePaneElement,
        path: &NodePath,
        state: PaneState,
    ) -> Result<Pane<C>, LayoutError>
    where
        F: ContentFactory<C>,
        H: DockHost<C>,
    {
        if !self.seen.insert(element.id) {
            return Err(LayoutError::DuplicatePane {
                path: path.clone(),
                pane: element.id,
            });
        }
        check_size(element.size, path, "Size")?;
        check_size(element.floating_size, path, "FloatingSize")?;
        if !(element.floating_position.x.is_finite() && element.floating_position.y.is_finite()) {
            return Err(LayoutError::InvalidSize {
                path: path.clone(),
                field: "FloatingPosition",
            });
        }
        let Some(content) = self.factory.resolve_content(&element.content) else {
            return Err(LayoutError::UnresolvedContent {
                path: path.clone(),
                key: element.content.clone(),
            });
        };

        let mut pane = Pane::new(PaneId::from_u64(element.id), content).restored(element.dock, state);
        pane.min_size = self.host.min_content_size(&pane.content);
        pane.size = element.size;
        pane.floating_position = element.floating_position;
        pane.floating_size = element.floating_size;
        Ok(pane)
    }

    fn node<C>(
        &mut self,
        tree: &mut CompositionTree<C>,
        element: &ChildElement,
        path: &NodePath,
    ) -> Result<NodeId, LayoutError>
    where
        F: ContentFactory<C>,
        H: DockHost<C>,
    {
        let factor = element.space_factor;
        if !(factor.is_finite() && factor > 0.0 && factor <= 1.0) {
            return Err(LayoutError::InvalidSpaceFactor {
                path: path.clone(),
                value: factor,
            });
        }

        let orientation = match element.kind {
            ChildType::Terminal => {
                let Some(pane_element) = &element.pane else {
                    return Err(LayoutError::MissingPane { path: path.clone() });
                };
                if pane_element.state != PersistedState::Docked {
                    return Err(LayoutError::InvalidState {
                        path: path.clone(),
                        state: pane_element.state,
                    });
                }
                let pane = self.pane(pane_element, path, PaneState::Docked)?;
                return Ok(tree.alloc(CompositionNode::Terminal(pane)));
            }
            ChildType::Horizontal => Orientation::Horizontal,
            ChildType::Vertical => Orientation::Vertical,
        };

        let children = match &element.children {
            Some(children) if !children.is_empty() => children,
            _ => return Err(LayoutError::MissingChildren { path: path.clone() }),
        };
        let mut built = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            let node = self.node(tree, child, &path.child(index))?;
            built.push(SplitChild::new(node, child.space_factor));
        }
        Ok(tree.alloc(CompositionNode::Split(Split::new(
            orientation,
            built,
            Vec2::ZERO,
        ))))
    }

    fn document<C>(&mut self, document: &LayoutDocument) -> Result<LoadedLayout<C>, LayoutError>
    where
        F: ContentFactory<C>,
        H: DockHost<C>,
    {
        if document.version != LAYOUT_DOCUMENT_VERSION {
            return Err(LayoutError::UnsupportedVersion {
                found: document.version,
                expected: LAYOUT_DOCUMENT_VERSION,
            });
        }

        let mut tree = CompositionTree::empty();
        if let Some(child) = &document.child {
            let root = self.node(&mut tree, child, &NodePath::Tree(Vec::new()))?;
            tree.set_root(Some(root));
            tree.canonicalize();
        }

        let mut floating = FloatingManager::default();
        let mut hidden = Vec::new();
        for (index, element) in document.floating_panes.iter().enumerate() {
            let path = NodePath::Floating(index);
            let state = element.state.to_state();
            match state {
                PaneState::Docked => {
                    return Err(LayoutError::InvalidState {
                        path,
                        state: element.state,
                    });
                }
                PaneState::Hidden => hidden.push(self.pane(element, &path, state)?),
                PaneState::Floating => {
                    let pane: Pane<C> = self.pane(element, &path, state)?;
                    let size = if pane.floating_size.x > 0.0 && pane.floating_size.y > 0.0 {
                        pane.floating_size
                    } else {
                        self.default_floating_size
                    };
                    floating.insert(FloatingContainer {
                        position: pane.floating_position,
                        size,
                        pane,
                    });
                }
            }
        }

        Ok(LoadedLayout {
            tree,
            floating,
            hidden,
        })
    }
}

fn check_size(size: Vec2, path: &NodePath, field: &'static str) -> Result<(), LayoutError> {
    if size.x.is_finite() && size.y.is_finite() && size.x >= 0.0 && size.y >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidSize {
            path: path.clone(),
            field,
        })
    }
}

impl<C> DockingSurface<C> {
    /// Capture the tree, the floating containers and the hidden shelf.
    pub fn snapshot_layout<F>(&self, factory: &mut F) -> LayoutDocument
    where
        F: ContentFactory<C>,
    {
        let child = self
            .tree
            .root()
            .and_then(|root| child_element(&self.tree, root, 1.0, factory));

        let mut floating_panes: Vec<DockablePaneElement> = self
            .floating
            .iter()
            .map(|container| {
                let mut element = pane_element(&container.pane, factory);
                element.floating_position = container.position;
                element.floating_size = container.size;
                element
            })
            .collect();
        floating_panes.extend(self.hidden.iter().map(|pane| pane_element(pane, factory)));

        LayoutDocument {
            version: LAYOUT_DOCUMENT_VERSION,
            child,
            floating_panes,
        }
    }

    /// Replace everything with the contents of `document`.
    ///
    /// All or nothing: on error the surface is left exactly as it was. On success a drag in
    /// progress is cancelled, every loaded pane gets its minimum size from `host`, and `host`
    /// hears about panes that became visible or stopped being visible. The previous panes are
    /// dropped.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] if the document has another version or fails validation.
    pub fn load_layout<F>(
        &mut self,
        host: &mut dyn DockHost<C>,
        document: &LayoutDocument,
        factory: &mut F,
    ) -> Result<(), LayoutError>
    where
        F: ContentFactory<C>,
    {
        let mut loader = Loader {
            factory,
            host: &mut *host,
            seen: AHashSet::new(),
            default_floating_size: self.options.default_floating_size,
        };
        let loaded = match loader.document(document) {
            Ok(loaded) => loaded,
            Err(err) => {
                log::warn!("layout load failed: {err}");
                return Err(err);
            }
        };

        self.cancel_drag(host);
        let was_visible = self.visible_pane_ids();
        for surface in std::mem::take(&mut self.pane_surfaces).into_values() {
            let _ = self.registry.unregister(surface);
        }

        self.tree = loaded.tree;
        self.floating = loaded.floating;
        self.hidden = loaded.hidden;
        for pane in self.tree.pane_ids() {
            self.register_pane_surface(pane);
        }
        self.after_structural_change();

        let now_visible = self.visible_pane_ids();
        let before: AHashSet<PaneId> = was_visible.iter().copied().collect();
        let after: AHashSet<PaneId> = now_visible.iter().copied().collect();
        for &pane in was_visible.iter().filter(|p| !after.contains(p)) {
            host.pane_visibility_changed(pane, false);
        }
        for &pane in now_visible.iter().filter(|p| !before.contains(p)) {
            host.pane_visibility_changed(pane, true);
        }
        log::debug!(
            "loaded layout: docked [{}], floating [{}], {} hidden",
            self.tree.pane_ids().iter().join(", "),
            self.floating.z_order().iter().join(", "),
            self.hidden.len()
        );
        Ok(())
    }

    /// Docked panes in traversal order, then floating panes back to front.
    fn visible_pane_ids(&self) -> Vec<PaneId> {
        let mut panes = self.tree.pane_ids();
        panes.extend_from_slice(self.floating.z_order());
        panes
    }

    /// # Errors
    /// Returns [`LayoutError::RonSerialize`] if ron cannot encode the document.
    pub fn save_layout_to_ron_string<F>(&self, factory: &mut F) -> Result<String, LayoutError>
    where
        F: ContentFactory<C>,
    {
        let document = self.snapshot_layout(factory);
        Ok(ron::ser::to_string_pretty(&document, pretty_ron_config())?)
    }

    /// Parse `ron` and hand it to [`Self::load_layout`].
    ///
    /// # Errors
    /// Returns [`LayoutError::RonDeserialize`] on malformed text, otherwise whatever
    /// [`Self::load_layout`] reports.
    pub fn load_layout_from_ron_str<F>(
        &mut self,
        host: &mut dyn DockHost<C>,
        ron: &str,
        factory: &mut F,
    ) -> Result<(), LayoutError>
    where
        F: ContentFactory<C>,
    {
        let document: LayoutDocument = ron::from_str(ron)?;
        self.load_layout(host, &document, factory)
    }

    /// # Errors
    /// Returns [`LayoutError::Io`] if the file cannot be written, or a serialization error.
    pub fn save_layout_to_ron_file<F>(&self, path: impl AsRef<Path>, factory: &mut F) -> Result<(), LayoutError>
    where
        F: ContentFactory<C>,
    {
        let ron = self.save_layout_to_ron_string(factory)?;
        std::fs::write(path, ron)?;
        Ok(())
    }

    /// # Errors
    /// Returns [`LayoutError::Io`] if the file cannot be read, otherwise whatever
    /// [`Self::load_layout_from_ron_str`] reports.
    pub fn load_layout_from_ron_file<F>(
        &mut self,
        host: &mut dyn DockHost<C>,
        path: impl AsRef<Path>,
        factory: &mut F,
    ) -> Result<(), LayoutError>
    where
        F: ContentFactory<C>,
    {
        let ron = std::fs::read_to_string(path)?;
        self.load_layout_from_ron_str(host, &ron, factory)
    }
}
