//! Presentation adapter
//!
//! Turns node snapshots into dashboard cards. Each [`NodeCard`] is built with
//! the node's attribute view, a handle on its busy flag, and the
//! presentation settings, all passed in explicitly. The card reads the busy
//! flag live, so a spinner shows while the node computes even if the
//! attribute snapshot is older.

use gizmo_engine::{AttributeKind, AttributeType, AttributeValue, BusyIndicator, NodeView};
use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Loading spinner styles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SpinnerStyle {
    Arc,
    Arcs,
    #[default]
    Bar,
    Dots,
    Petal,
}

/// Settings shared by every card
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationConfig {
    pub spinner: SpinnerStyle,
    /// Spinner width and height in pixels
    pub spinner_size: u32,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            spinner: SpinnerStyle::default(),
            spinner_size: defaults::SPINNER_SIZE,
        }
    }
}

/// A spinner as rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpinnerView {
    pub style: SpinnerStyle,
    pub size: u32,
    pub active: bool,
}

/// One attribute field on a card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub kind: AttributeKind,
    pub value_type: AttributeType,
    pub value: AttributeValue,
    /// Whether the user can write this field right now
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_to: Option<String>,
}

/// A rendered card: header (title + spinner) and fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub title: String,
    pub node_type: String,
    pub spinner: SpinnerView,
    pub disabled: bool,
    pub fields: Vec<FieldView>,
}

/// The whole dashboard as rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Any node busy
    pub busy: bool,
    pub spinner: SpinnerView,
    pub cards: Vec<CardView>,
}

/// Card for one node
pub struct NodeCard {
    view: NodeView,
    busy: BusyIndicator,
    spinner: SpinnerStyle,
    spinner_size: u32,
}

impl NodeCard {
    pub fn new(view: NodeView, busy: BusyIndicator, config: &PresentationConfig) -> Self {
        Self {
            view,
            busy,
            spinner: config.spinner,
            spinner_size: config.spinner_size,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Render the card; a disabled card has no editable fields
    pub fn render(&self, disabled: bool) -> CardView {
        let fields = self
            .view
            .attributes
            .iter()
            .map(|attr| FieldView {
                name: attr.name.clone(),
                label: attr.label.clone(),
                kind: attr.kind,
                value_type: attr.value_type,
                value: attr.value,
                editable: !disabled && attr.is_editable(),
                bound_to: attr.bound_to.clone(),
            })
            .collect();

        CardView {
            title: self.view.name.clone(),
            node_type: self.view.node_type.clone(),
            spinner: SpinnerView {
                style: self.spinner,
                size: self.spinner_size,
                active: self.is_busy(),
            },
            disabled,
            fields,
        }
    }
}

/// Column of cards sharing one busy state
pub struct Dashboard {
    cards: Vec<NodeCard>,
    config: PresentationConfig,
}

impl Dashboard {
    pub fn new(cards: Vec<NodeCard>, config: PresentationConfig) -> Self {
        Self { cards, config }
    }

    /// Whether any card's node is computing
    pub fn is_busy(&self) -> bool {
        self.cards.iter().any(NodeCard::is_busy)
    }

    /// Render every card; all cards are disabled while any node is busy
    pub fn render(&self) -> DashboardView {
        let busy = self.is_busy();
        DashboardView {
            busy,
            spinner: SpinnerView {
                style: self.config.spinner,
                size: self.config.spinner_size,
                active: busy,
            },
            cards: self.cards.iter().map(|card| card.render(busy)).collect(),
        }
    }
}
