use std::process::Command;

use tonic_build::Builder;

// The generated code lives in src/pb and is checked in, so a plain build does
// not need protoc. Set REGENERATE_PROTO=1 after editing the proto file.
fn main() {
    println!("cargo:rerun-if-changed=protos/reservation.proto");
    println!("cargo:rerun-if-env-changed=REGENERATE_PROTO");
    if std::env::var_os("REGENERATE_PROTO").is_none() {
        return;
    }

    tonic_build::configure()
        .out_dir("src/pb")
        .with_builder(&["reservation.ReservationQuery"])
        .with_builder_into(
            "reservation.ReservationQuery",
            &["product_id", "user_id", "status"],
        )
        .compile(&["protos/reservation.proto"], &["protos"])
        .unwrap();
    Command::new("cargo").args(["fmt"]).output().unwrap();
}

trait BuilderExt {
    fn with_builder(self, paths: &[&str]) -> Self;
    fn with_builder_into(self, path: &str, fields: &[&str]) -> Self;
}

impl BuilderExt for Builder {
    fn with_builder(self, paths: &[&str]) -> Self {
        paths.iter().fold(self, |acc, path| {
            acc.type_attribute(path, "#[derive(derive_builder::Builder)]")
        })
    }

    fn with_builder_into(self, path: &str, fields: &[&str]) -> Self {
        fields.iter().fold(self, |acc, field| {
            acc.field_attribute(
                format!("{}.{}", path, field),
                "#[builder(setter(into), default)]",
            )
        })
    }
}
