use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use log::{info, warn};

use crate::components::family_tree::{
	AvatarFuture, AvatarResolver, FamilyTreeCanvas, Language, PersonTreeNode, RelationshipDirection,
	ViewConfig, ViewMode,
};

/// Three generations around one focal person, in the backend payload shape.
const SAMPLE_TREE: &str = r#"{
	"id": "p1",
	"nameEnglish": "Idris Hassan",
	"nameArabic": "إدريس حسن",
	"sex": 0,
	"birthDate": "1962-03-14",
	"isLiving": true,
	"avatarMediaId": "idris",
	"parents": [
		{
			"id": "p2", "nameEnglish": "Hassan Omar", "sex": 0,
			"birthDate": "1931", "deathDate": "2004-11-02",
			"parents": [
				{ "id": "p4", "nameEnglish": "Omar Salih", "sex": 0, "birthDate": "1899", "deathDate": "1968" },
				{ "id": "p5", "nameEnglish": "Zainab Ali", "sex": 1, "birthDate": "1905" }
			]
		},
		{
			"id": "p3", "nameEnglish": "Amna Ibrahim", "sex": 1,
			"birthDate": "1938-07-01", "deathDate": "2015",
			"crossTreeLinks": [
				{
					"linkId": "l1", "linkType": "same", "targetPersonId": "x9",
					"targetPersonName": "Amna Ibrahim Musa", "targetTreeId": "t2",
					"targetTreeName": "Musa family"
				}
			],
			"parents": [
				{ "id": "p6", "nameEnglish": "Ibrahim Musa", "sex": 0, "birthDate": "1910", "deathDate": "1979" }
			]
		}
	],
	"unions": [
		{ "partners": [{ "id": "p7", "nameEnglish": "Fatima Yousif", "sex": 1, "birthDate": "1966", "isLiving": true, "avatarMediaId": "fatima" }] }
	],
	"children": [
		{
			"id": "p8", "nameEnglish": "Salma Idris", "sex": 1, "birthDate": "1990", "isLiving": true,
			"children": [{ "id": "p10", "nameEnglish": "Nour", "sex": 1, "birthDate": "2018", "isLiving": true }]
		},
		{ "id": "p9", "nameEnglish": "Khalid Idris", "sex": 0, "birthDate": "1994-05-20", "isLiving": true }
	]
}"#;

fn sample_tree() -> Option<PersonTreeNode> {
	match PersonTreeNode::from_json(SAMPLE_TREE) {
		Ok(tree) => Some(tree),
		Err(err) => {
			warn!("sample tree rejected: {err}");
			None
		}
	}
}

/// Placeholder portraits keyed by media id.
fn demo_avatar_resolver() -> AvatarResolver {
	std::rc::Rc::new(|media_id: String| -> AvatarFuture {
		Box::pin(async move { Ok(format!("https://picsum.photos/seed/{media_id}/64")) })
	})
}

/// Initial view from `?mode=...&lang=...`, so a view can be linked to.
fn view_from_query(mode: Option<&str>, lang: Option<&str>) -> ViewConfig {
	ViewConfig {
		mode: mode.map(ViewMode::parse).unwrap_or_default(),
		language: lang.map(Language::parse).unwrap_or_default(),
		..ViewConfig::default()
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let tree = Signal::derive(sample_tree);
	let query = use_query_map();
	let view_config = RwSignal::new(query.with_untracked(|q| {
		view_from_query(q.get("mode").as_deref(), q.get("lang").as_deref())
	}));

	let set_mode = move |mode: ViewMode| view_config.update(|v| v.mode = mode);
	let mode_button = move |mode: ViewMode| {
		view! {
			<button
				class=move || {
					if view_config.get().mode == mode { "mode active" } else { "mode" }
				}
				on:click=move |_| set_mode(mode)
			>
				{mode.as_str()}
			</button>
		}
	};

	let on_person_selected = Callback::new(|id: String| info!("selected {id}"));
	let on_person_double_clicked = Callback::new(|id: String| info!("open profile {id}"));
	let on_cross_tree_link_clicked = Callback::new(|link_id: String| info!("follow link {link_id}"));
	let on_find_relationship = Callback::new(|id: String| info!("find relationship from {id}"));
	let on_add_relationship = Callback::new(|(id, direction): (String, RelationshipDirection)| {
		info!("add {} for {id}", direction.as_str())
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<FamilyTreeCanvas
					tree=tree
					view=view_config
					fullscreen=true
					avatar_resolver=demo_avatar_resolver()
					on_person_selected=on_person_selected
					on_person_double_clicked=on_person_double_clicked
					on_cross_tree_link_clicked=on_cross_tree_link_clicked
					on_find_relationship=on_find_relationship
					on_add_relationship=on_add_relationship
				/>
				<div class="graph-overlay">
					<h1>"Family Tree"</h1>
					<p class="subtitle">
						"Click a person to select. Drag to rearrange. Scroll to zoom. Drag background to pan."
					</p>
					<div class="controls">
						{mode_button(ViewMode::Pedigree)}
						{mode_button(ViewMode::Descendants)}
						{mode_button(ViewMode::Hourglass)}
						{mode_button(ViewMode::Timeline)}
					</div>
					<div class="controls">
						<button on:click=move |_| {
							view_config.update(|v| v.max_depth = v.depth().saturating_sub(1).max(1))
						}>"−"</button>
						<span>{move || format!("depth {}", view_config.get().depth())}</span>
						<button on:click=move |_| {
							view_config.update(|v| v.max_depth = (v.depth() + 1).min(10))
						}>"+"</button>
						<label>
							<input
								type="checkbox"
								prop:checked=move || view_config.get().include_spouses
								on:change=move |_| view_config.update(|v| v.include_spouses = !v.include_spouses)
							/>
							"spouses"
						</label>
						<select on:change=move |ev| {
							let language = Language::parse(&event_target_value(&ev));
							view_config.update(|v| v.language = language)
						}>
							<option value="en" selected=move || view_config.get().language == Language::English>
								"English"
							</option>
							<option value="ar" selected=move || view_config.get().language == Language::Arabic>
								"العربية"
							</option>
							<option value="nob" selected=move || view_config.get().language == Language::Nobiin>
								"Nobiin"
							</option>
						</select>
					</div>
				</div>
			</div>
		</ErrorBoundary>
	}
}
