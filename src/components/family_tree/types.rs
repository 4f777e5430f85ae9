use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Deserializer};

use super::config::Language;
use super::dates;
use super::error::FamilyTreeError;

pub type NodeIdx = usize;

pub const NAME_PLACEHOLDER: &str = "Unknown";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Sex {
	Male,
	Female,
	#[default]
	Unknown,
}

impl<'de> Deserialize<'de> for Sex {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Code(i64),
			Name(String),
		}

		Ok(match Option::<Raw>::deserialize(deserializer)? {
			Some(Raw::Code(0)) => Sex::Male,
			Some(Raw::Code(1)) => Sex::Female,
			Some(Raw::Name(name)) => match name.trim().to_lowercase().as_str() {
				"male" | "m" => Sex::Male,
				"female" | "f" => Sex::Female,
				_ => Sex::Unknown,
			},
			_ => Sex::Unknown,
		})
	}
}

/// Missing and `null` relationship arrays both mean "no relatives".
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CrossTreeLinkType {
	Same,
	Ancestor,
	#[default]
	Related,
}

impl CrossTreeLinkType {
	pub fn as_str(&self) -> &'static str {
		match self {
			CrossTreeLinkType::Same => "same person",
			CrossTreeLinkType::Ancestor => "ancestor",
			CrossTreeLinkType::Related => "related",
		}
	}
}

// Names are matched case-insensitively; the backend enum codes are 0..=2.
impl<'de> Deserialize<'de> for CrossTreeLinkType {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Code(i64),
			Name(String),
		}

		Ok(match Option::<Raw>::deserialize(deserializer)? {
			Some(Raw::Code(0)) => CrossTreeLinkType::Same,
			Some(Raw::Code(1)) => CrossTreeLinkType::Ancestor,
			Some(Raw::Name(name)) => match name.trim().to_lowercase().as_str() {
				"same" => CrossTreeLinkType::Same,
				"ancestor" => CrossTreeLinkType::Ancestor,
				_ => CrossTreeLinkType::Related,
			},
			_ => CrossTreeLinkType::Related,
		})
	}
}

/// A connection from this person to a person in another tree.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossTreeLink {
	pub link_id: String,
	#[serde(default)]
	pub link_type: CrossTreeLinkType,
	pub target_person_id: String,
	#[serde(default)]
	pub target_person_name: Option<String>,
	#[serde(default)]
	pub target_tree_id: Option<String>,
	#[serde(default)]
	pub target_tree_name: Option<String>,
}

impl CrossTreeLink {
	/// One-line description: target person, link type, then the other tree.
	pub fn summary(&self) -> String {
		let target = self
			.target_person_name
			.as_deref()
			.filter(|name| !name.trim().is_empty())
			.unwrap_or(&self.target_person_id);
		let mut text = format!("{target} ({})", self.link_type.as_str());
		if let Some(tree) = self.target_tree_name.as_deref().or(self.target_tree_id.as_deref()) {
			text.push_str(" in ");
			text.push_str(tree);
		}
		text
	}
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Union {
	#[serde(default, deserialize_with = "null_as_empty")]
	pub partners: Vec<PersonTreeNode>,
}

/// The nested person payload delivered by the backend.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonTreeNode {
	pub id: String,
	#[serde(default)]
	pub primary_name: Option<String>,
	#[serde(default)]
	pub name_english: Option<String>,
	#[serde(default)]
	pub name_arabic: Option<String>,
	#[serde(default)]
	pub name_nobiin: Option<String>,
	#[serde(default)]
	pub sex: Sex,
	#[serde(default)]
	pub birth_date: Option<String>,
	#[serde(default)]
	pub death_date: Option<String>,
	#[serde(default)]
	pub is_living: bool,
	#[serde(default)]
	pub avatar_media_id: Option<String>,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub parents: Vec<PersonTreeNode>,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub children: Vec<PersonTreeNode>,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub unions: Vec<Union>,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub cross_tree_links: Vec<CrossTreeLink>,
}

impl PersonTreeNode {
	pub fn from_json(json: &str) -> Result<Self, FamilyTreeError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Depth-first search through parents, children and partners.
	pub fn find(&self, id: &str) -> Option<&PersonTreeNode> {
		let mut stack = vec![self];
		let mut seen = BTreeSet::new();
		while let Some(person) = stack.pop() {
			if person.id == id {
				return Some(person);
			}
			if !seen.insert(person.id.as_str()) {
				continue;
			}
			stack.extend(person.parents.iter());
			stack.extend(person.children.iter());
			stack.extend(person.unions.iter().flat_map(|u| u.partners.iter()));
		}
		None
	}

	pub fn partners(&self) -> impl Iterator<Item = &PersonTreeNode> {
		self.unions
			.iter()
			.flat_map(|u| u.partners.iter())
			.filter(move |p| p.id != self.id)
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PersonNames {
	pub primary: Option<String>,
	pub english: Option<String>,
	pub arabic: Option<String>,
	pub nobiin: Option<String>,
}

impl PersonNames {
	/// Requested language, then English, then Arabic, then the primary name.
	pub fn resolve(&self, language: Language) -> &str {
		let requested = match language {
			Language::English => &self.english,
			Language::Arabic => &self.arabic,
			Language::Nobiin => &self.nobiin,
		};
		[requested, &self.english, &self.arabic, &self.primary]
			.into_iter()
			.filter_map(|name| name.as_deref())
			.map(str::trim)
			.find(|name| !name.is_empty())
			.unwrap_or(NAME_PLACEHOLDER)
	}
}

pub fn initials(name: &str) -> String {
	name.split_whitespace()
		.take(2)
		.filter_map(|word| word.chars().next())
		.flat_map(char::to_uppercase)
		.collect()
}

/// How a node came to be materialized during the graph walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
	Root,
	Ancestor { child: NodeIdx },
	Descendant { parent: NodeIdx },
	/// `offset` counts from 1 along the anchor's spouse chain.
	Spouse { anchor: NodeIdx, offset: u32 },
}

/// A person as positioned in one rendered view.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonNode {
	pub id: String,
	pub names: PersonNames,
	pub sex: Sex,
	pub birth_year: Option<i32>,
	pub death_year: Option<i32>,
	pub is_living: bool,
	pub generation: i32,
	pub x: f64,
	pub y: f64,
	pub placement: Placement,
	pub avatar_media_id: Option<String>,
	pub cross_tree_links: Vec<CrossTreeLink>,
}

impl PersonNode {
	pub fn from_tree(person: &PersonTreeNode, generation: i32, placement: Placement) -> Self {
		Self {
			id: person.id.clone(),
			names: PersonNames {
				primary: person.primary_name.clone(),
				english: person.name_english.clone(),
				arabic: person.name_arabic.clone(),
				nobiin: person.name_nobiin.clone(),
			},
			sex: person.sex,
			birth_year: person.birth_date.as_deref().and_then(dates::parse_year),
			death_year: person.death_date.as_deref().and_then(dates::parse_year),
			is_living: person.is_living,
			generation,
			x: 0.0,
			y: 0.0,
			placement,
			avatar_media_id: person
				.avatar_media_id
				.clone()
				.filter(|id| !id.trim().is_empty()),
			cross_tree_links: person.cross_tree_links.clone(),
		}
	}

	pub fn display_name(&self, language: Language) -> &str {
		self.names.resolve(language)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
	ParentChild,
	Spouse,
}

/// For [`EdgeKind::ParentChild`], `from` is the parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
	pub kind: EdgeKind,
	pub from: NodeIdx,
	pub to: NodeIdx,
}

impl Edge {
	pub fn touches(&self, idx: NodeIdx) -> bool {
		self.from == idx || self.to == idx
	}

	pub fn other(&self, idx: NodeIdx) -> NodeIdx {
		if self.from == idx { self.to } else { self.from }
	}
}

/// Node arena for one build pass. Index 0 is always the focal person.
#[derive(Clone, Debug, Default)]
pub struct FamilyGraph {
	pub nodes: Vec<PersonNode>,
	pub edges: Vec<Edge>,
	index: HashMap<String, NodeIdx>,
}

impl FamilyGraph {
	pub fn push(&mut self, node: PersonNode) -> NodeIdx {
		let idx = self.nodes.len();
		self.index.insert(node.id.clone(), idx);
		self.nodes.push(node);
		idx
	}

	pub fn index_of(&self, id: &str) -> Option<NodeIdx> {
		self.index.get(id).copied()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn incident_edges(&self, idx: NodeIdx) -> impl Iterator<Item = usize> + '_ {
		self.edges
			.iter()
			.enumerate()
			.filter(move |(_, edge)| edge.touches(idx))
			.map(|(i, _)| i)
	}

	pub fn neighbors(&self, idx: NodeIdx) -> impl Iterator<Item = NodeIdx> + '_ {
		self.edges
			.iter()
			.filter(move |edge| edge.touches(idx))
			.map(move |edge| edge.other(idx))
	}

	/// Parents materialized through `idx`, in payload order.
	pub fn tree_parents(&self, idx: NodeIdx) -> Vec<NodeIdx> {
		self.placed_by(|p| p == Placement::Ancestor { child: idx })
	}

	/// Children materialized through `idx`, in payload order.
	pub fn tree_children(&self, idx: NodeIdx) -> Vec<NodeIdx> {
		self.placed_by(|p| p == Placement::Descendant { parent: idx })
	}

	/// Spouses materialized through `idx`, by offset.
	pub fn tree_spouses(&self, idx: NodeIdx) -> Vec<NodeIdx> {
		let mut spouses: Vec<(u32, NodeIdx)> = self
			.nodes
			.iter()
			.enumerate()
			.filter_map(|(i, node)| match node.placement {
				Placement::Spouse { anchor, offset } if anchor == idx => Some((offset, i)),
				_ => None,
			})
			.collect();
		spouses.sort();
		spouses.into_iter().map(|(_, i)| i).collect()
	}

	fn placed_by(&self, pred: impl Fn(Placement) -> bool) -> Vec<NodeIdx> {
		self.nodes
			.iter()
			.enumerate()
			.filter(|(_, node)| pred(node.placement))
			.map(|(i, _)| i)
			.collect()
	}

	pub fn generations(&self) -> BTreeSet<i32> {
		self.nodes.iter().map(|node| node.generation).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_decode_tolerates_missing_and_null_arrays() {
		let person: PersonTreeNode = serde_json::from_value(json!({
			"id": "p1",
			"nameEnglish": "Amna Hassan",
			"sex": "female",
			"parents": null,
			"unions": [{ "partners": null }]
		}))
		.unwrap();
		assert_eq!(person.sex, Sex::Female);
		assert!(person.parents.is_empty());
		assert!(person.children.is_empty());
		assert_eq!(person.unions.len(), 1);
		assert!(person.unions[0].partners.is_empty());
		assert!(!person.is_living);
	}

	#[test]
	fn test_sex_accepts_backend_codes() {
		let decode = |value: serde_json::Value| {
			serde_json::from_value::<PersonTreeNode>(json!({ "id": "x", "sex": value }))
				.unwrap()
				.sex
		};
		assert_eq!(decode(json!(0)), Sex::Male);
		assert_eq!(decode(json!(1)), Sex::Female);
		assert_eq!(decode(json!(2)), Sex::Unknown);
		assert_eq!(decode(json!("Male")), Sex::Male);
		assert_eq!(decode(json!(null)), Sex::Unknown);
	}

	#[test]
	fn test_from_json_reports_payload_errors() {
		let err = PersonTreeNode::from_json("{\"name\": 1}").unwrap_err();
		assert!(matches!(err, FamilyTreeError::Payload(_)));
	}

	#[test]
	fn test_unknown_link_type_is_related() {
		let link: CrossTreeLink = serde_json::from_value(json!({
			"linkId": "l1",
			"linkType": "Cousin",
			"targetPersonId": "p9"
		}))
		.unwrap();
		assert_eq!(link.link_type, CrossTreeLinkType::Related);
	}

	#[test]
	fn test_link_summary_names_type_and_tree() {
		let link: CrossTreeLink = serde_json::from_value(json!({
			"linkId": "l1",
			"linkType": "same",
			"targetPersonId": "x9",
			"targetPersonName": "Amna Ibrahim Musa",
			"targetTreeName": "Musa family"
		}))
		.unwrap();
		assert_eq!(link.summary(), "Amna Ibrahim Musa (same person) in Musa family");

		let bare: CrossTreeLink = serde_json::from_value(json!({
			"linkId": "l2",
			"linkType": "ancestor",
			"targetPersonId": "x10"
		}))
		.unwrap();
		assert_eq!(bare.summary(), "x10 (ancestor)");
	}

	#[test]
	fn test_link_type_ignores_case() {
		let decode = |value: serde_json::Value| {
			serde_json::from_value::<CrossTreeLink>(json!({
				"linkId": "l1",
				"linkType": value,
				"targetPersonId": "p9"
			}))
			.unwrap()
			.link_type
		};
		assert_eq!(decode(json!("same")), CrossTreeLinkType::Same);
		assert_eq!(decode(json!(" ANCESTOR ")), CrossTreeLinkType::Ancestor);
		assert_eq!(decode(json!("Related")), CrossTreeLinkType::Related);
		assert_eq!(decode(json!(1)), CrossTreeLinkType::Ancestor);
		assert_eq!(decode(json!(null)), CrossTreeLinkType::Related);
	}

	#[test]
	fn test_name_fallback_chain() {
		let mut names = PersonNames {
			primary: Some("Primary".into()),
			english: Some("English".into()),
			arabic: Some("عربي".into()),
			nobiin: None,
		};
		assert_eq!(names.resolve(Language::Arabic), "عربي");
		assert_eq!(names.resolve(Language::Nobiin), "English");
		names.english = Some("   ".into());
		assert_eq!(names.resolve(Language::Nobiin), "عربي");
		names.arabic = None;
		assert_eq!(names.resolve(Language::English), "Primary");
		assert_eq!(PersonNames::default().resolve(Language::Arabic), NAME_PLACEHOLDER);
	}

	#[test]
	fn test_initials() {
		assert_eq!(initials("amna hassan idris"), "AH");
		assert_eq!(initials("Osman"), "O");
		assert_eq!(initials("  "), "");
	}

	#[test]
	fn test_find_walks_all_directions() {
		let tree: PersonTreeNode = serde_json::from_value(json!({
			"id": "root",
			"parents": [{ "id": "dad", "parents": [{ "id": "grandpa" }] }],
			"unions": [{ "partners": [{ "id": "wife" }] }]
		}))
		.unwrap();
		assert_eq!(tree.find("grandpa").map(|p| p.id.as_str()), Some("grandpa"));
		assert_eq!(tree.find("wife").map(|p| p.id.as_str()), Some("wife"));
		assert!(tree.find("nobody").is_none());
	}

	#[test]
	fn test_partners_skip_self() {
		let tree: PersonTreeNode = serde_json::from_value(json!({
			"id": "root",
			"unions": [{ "partners": [{ "id": "root" }, { "id": "wife" }] }]
		}))
		.unwrap();
		let ids: Vec<&str> = tree.partners().map(|p| p.id.as_str()).collect();
		assert_eq!(ids, vec!["wife"]);
	}
}
