use std::collections::HashMap;
use std::fmt::Write as _;

use crate::error::ExportError;
use crate::math::Point3;
use crate::topology::SolidData;

/// Writes a solid as an ISO 10303-21 file holding one AP214 `FACETED_BREP`.
///
/// Every polygon becomes a `FACE` bounded by a `POLY_LOOP`; corners shared
/// between polygons share one `CARTESIAN_POINT`. Lengths are millimetres.
///
/// # Errors
///
/// Returns `ExportError::Empty` for a solid without faces and
/// `ExportError::NonPlanarFace` for a polygon with fewer than three corners.
pub fn write_step(solid: &SolidData, name: &str) -> Result<String, ExportError> {
    if solid.is_empty() {
        return Err(ExportError::Empty);
    }
    let name = sanitize(name);
    let mut writer = StepWriter::default();

    let mut points: HashMap<[u64; 3], u64> = HashMap::new();
    let mut faces = Vec::with_capacity(solid.polygons.len());
    for (index, polygon) in solid.polygons.iter().enumerate() {
        if polygon.vertices().len() < 3 {
            return Err(ExportError::NonPlanarFace(format!(
                "face {index} has {} corners",
                polygon.vertices().len()
            )));
        }
        let refs: Vec<u64> = polygon
            .vertices()
            .iter()
            .map(|v| {
                *points
                    .entry(point_key(v))
                    .or_insert_with(|| writer.add(write_cartesian_point(v)))
            })
            .collect();
        let poly_loop = writer.add(format!("POLY_LOOP('', ({}))", join_refs(&refs)));
        let bound = writer.add(format!("FACE_OUTER_BOUND('', #{poly_loop}, .T.)"));
        faces.push(writer.add(format!("FACE('', (#{bound}))")));
    }
    let shell = writer.add(format!("CLOSED_SHELL('', ({}))", join_refs(&faces)));
    let brep = writer.add(format!("FACETED_BREP('{name}', #{shell})"));

    let context = writer.add_units_context();
    let origin = writer.add(write_cartesian_point(&Point3::origin()));
    let axis = writer.add("DIRECTION('', (0.0, 0.0, 1.0))".into());
    let ref_dir = writer.add("DIRECTION('', (1.0, 0.0, 0.0))".into());
    let placement = writer.add(format!(
        "AXIS2_PLACEMENT_3D('', #{origin}, #{axis}, #{ref_dir})"
    ));
    let representation = writer.add(format!(
        "FACETED_BREP_SHAPE_REPRESENTATION('{name}', (#{placement}, #{brep}), #{context})"
    ));
    writer.add_product(&name, representation);

    Ok(writer.finish(&name))
}

#[derive(Default)]
struct StepWriter {
    entities: Vec<String>,
}

impl StepWriter {
    /// Appends an entity and returns its instance id.
    fn add(&mut self, entity: String) -> u64 {
        self.entities.push(entity);
        self.entities.len() as u64
    }

    fn add_units_context(&mut self) -> u64 {
        let length = self.add("( LENGTH_UNIT() NAMED_UNIT(*) SI_UNIT(.MILLI., .METRE.) )".into());
        let angle = self.add("( NAMED_UNIT(*) PLANE_ANGLE_UNIT() SI_UNIT($, .RADIAN.) )".into());
        let solid_angle =
            self.add("( NAMED_UNIT(*) SI_UNIT($, .STERADIAN.) SOLID_ANGLE_UNIT() )".into());
        let uncertainty = self.add(format!(
            "UNCERTAINTY_MEASURE_WITH_UNIT(LENGTH_MEASURE(1.E-07), #{length}, \
             'distance_accuracy_value', 'confusion accuracy')"
        ));
        self.add(format!(
            "( GEOMETRIC_REPRESENTATION_CONTEXT(3) \
             GLOBAL_UNCERTAINTY_ASSIGNED_CONTEXT((#{uncertainty})) \
             GLOBAL_UNIT_ASSIGNED_CONTEXT((#{length}, #{angle}, #{solid_angle})) \
             REPRESENTATION_CONTEXT('Context #1', '3D Context with UNIT and UNCERTAINTY') )"
        ))
    }

    fn add_product(&mut self, name: &str, representation: u64) {
        let app = self.add(
            "APPLICATION_CONTEXT('core data for automotive mechanical design processes')".into(),
        );
        self.add(format!(
            "APPLICATION_PROTOCOL_DEFINITION('international standard', 'automotive_design', 2000, #{app})"
        ));
        let product_context = self.add(format!("PRODUCT_CONTEXT('', #{app}, 'mechanical')"));
        let product = self.add(format!(
            "PRODUCT('{name}', '{name}', '', (#{product_context}))"
        ));
        let formation = self.add(format!(
            "PRODUCT_DEFINITION_FORMATION('', '', #{product})"
        ));
        let definition_context =
            self.add(format!("PRODUCT_DEFINITION_CONTEXT('part definition', #{app}, 'design')"));
        let definition = self.add(format!(
            "PRODUCT_DEFINITION('design', '', #{formation}, #{definition_context})"
        ));
        let shape = self.add(format!("PRODUCT_DEFINITION_SHAPE('', '', #{definition})"));
        self.add(format!(
            "SHAPE_DEFINITION_REPRESENTATION(#{shape}, #{representation})"
        ));
    }

    fn finish(self, name: &str) -> String {
        let mut out = String::with_capacity(self.entities.len() * 64 + 512);
        out.push_str("ISO-10303-21;\nHEADER;\n");
        out.push_str("FILE_DESCRIPTION(('slipcast faceted solid'), '2;1');\n");
        let _ = writeln!(
            out,
            "FILE_NAME('{name}.step', '', (''), (''), 'slipcast', 'slipcast', '');"
        );
        out.push_str("FILE_SCHEMA(('AUTOMOTIVE_DESIGN { 1 0 10303 214 1 1 1 1 }'));\n");
        out.push_str("ENDSEC;\nDATA;\n");
        for (index, entity) in self.entities.iter().enumerate() {
            let _ = writeln!(out, "#{} = {entity};", index + 1);
        }
        out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
        out
    }
}

fn write_cartesian_point(p: &Point3) -> String {
    format!(
        "CARTESIAN_POINT('', ({:.15E}, {:.15E}, {:.15E}))",
        p.x, p.y, p.z
    )
}

fn point_key(p: &Point3) -> [u64; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

fn join_refs(ids: &[u64]) -> String {
    let refs: Vec<String> = ids.iter().map(|id| format!("#{id}")).collect();
    refs.join(", ")
}

/// Keeps names inside a STEP string literal.
fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '\'' && *c != '\\')
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;
    use crate::topology::SolidStore;

    fn unit_box() -> SolidData {
        let mut store = SolidStore::new();
        let id = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        store.solid(id).unwrap().clone()
    }

    #[test]
    fn box_is_a_closed_faceted_brep() {
        let text = write_step(&unit_box(), "inner-mould").unwrap();
        assert!(text.starts_with("ISO-10303-21;"));
        assert!(text.trim_end().ends_with("END-ISO-10303-21;"));
        assert_eq!(text.matches("= FACE(").count(), 6);
        assert_eq!(text.matches("POLY_LOOP(").count(), 6);
        // Eight box corners plus the placement origin.
        assert_eq!(text.matches("CARTESIAN_POINT(").count(), 9);
        assert!(text.contains("FACETED_BREP('inner-mould'"));
        assert!(text.contains("SI_UNIT(.MILLI., .METRE.)"));
    }

    #[test]
    fn entity_references_point_backwards() {
        let text = write_step(&unit_box(), "part").unwrap();
        for line in text.lines().filter(|l| l.starts_with('#')) {
            let (id, body) = line.split_once(" = ").unwrap();
            let id: u64 = id[1..].parse().unwrap();
            for reference in body.split('#').skip(1) {
                let digits: String = reference.chars().take_while(char::is_ascii_digit).collect();
                if let Ok(target) = digits.parse::<u64>() {
                    assert!(target < id, "#{id} refers forward to #{target}");
                }
            }
        }
    }

    #[test]
    fn quotes_in_names_are_dropped() {
        let text = write_step(&unit_box(), "it's").unwrap();
        assert!(text.contains("FACETED_BREP('its'"));
    }

    #[test]
    fn empty_solid_is_rejected() {
        assert!(matches!(
            write_step(&SolidData::new(Vec::new()), "x"),
            Err(ExportError::Empty)
        ));
    }
}
