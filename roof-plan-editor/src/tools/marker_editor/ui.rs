use bevy::prelude::*;

use super::state::PlacementState;
use super::store::{MarkerStore, RoofType};

#[derive(Component)]
pub struct ModeText;

#[derive(Component)]
pub struct DimensionsText;

/// Text overlay in the plan viewport: active mode top-left, selected
/// footprint dimensions underneath.
pub fn spawn_editor_ui(mut commands: Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("mode: select"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                ModeText,
            ));
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(34.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                DimensionsText,
            ));
        });
}

pub fn update_mode_text(
    place: Res<PlacementState>,
    mut q: Query<&mut Text, With<ModeText>>,
) {
    if !place.is_changed() {
        return;
    }
    for mut text in &mut q {
        text.0 = if place.active {
            match place.roof_type {
                RoofType::Flat => "mode: place flat roof".to_string(),
                RoofType::DualPitch => "mode: place dual-pitch roof".to_string(),
            }
        } else {
            "mode: select".to_string()
        };
    }
}

/// Dimensions come from the store, not the entity transform, so the readout
/// shows exactly what downstream consumers see. Gated on store change
/// detection; an idle store never rewrites the text.
pub fn update_dimensions_text(
    store: Res<MarkerStore>,
    mut q: Query<&mut Text, With<DimensionsText>>,
) {
    if !store.is_changed() {
        return;
    }
    for mut text in &mut q {
        text.0 = match store.selected() {
            Some(marker) => format!(
                "{:.1} m x {:.1} m",
                marker.width_meters, marker.height_meters
            ),
            None => String::new(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::marker_editor::store::{MarkerId, MarkerTransform};

    #[test]
    fn dimensions_text_only_rewrites_when_the_store_changes() {
        let mut app = App::new();
        app.init_resource::<MarkerStore>()
            .add_systems(Update, update_dimensions_text);
        let readout = app
            .world_mut()
            .spawn((Text::new(""), DimensionsText))
            .id();

        {
            let mut store = app.world_mut().resource_mut::<MarkerStore>();
            let mut marker = MarkerTransform::new(MarkerId(1), RoofType::Flat, Vec3::ZERO);
            marker.set_scale(2.0, 1.5);
            store.upsert(marker);
            store.select(Some(MarkerId(1)));
        }
        app.update();
        assert_eq!(
            app.world().get::<Text>(readout).unwrap().0,
            "20.0 m x 15.0 m"
        );

        // Scribble over the text; an untouched store must not rewrite it.
        app.world_mut().get_mut::<Text>(readout).unwrap().0 = "scribble".into();
        app.update();
        assert_eq!(app.world().get::<Text>(readout).unwrap().0, "scribble");

        // The next store mutation refreshes the readout.
        app.world_mut().resource_mut::<MarkerStore>().select(None);
        app.update();
        assert_eq!(app.world().get::<Text>(readout).unwrap().0, "");
    }
}
