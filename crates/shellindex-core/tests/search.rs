use serde_json::json;
use shellindex_core::{parse, Document, ElementKind, ParseErrorKind, StoredDocument, Term};

fn pump() -> Document {
    serde_json::from_value(json!({
        "endpoint": "https://registry.plant.local",
        "id": "urn:shell:pump:0815",
        "idShort": "CentrifugalPump",
        "assetId": "urn:asset:pump:0815",
        "submodels": [
            {
                "modelType": "Submodel",
                "idShort": "Nameplate",
                "id": "urn:sm:nameplate:0815",
                "submodelElements": [
                    {
                        "modelType": "MultiLanguageProperty",
                        "idShort": "ManufacturerName",
                        "value": [
                            { "language": "en", "text": "ACME Pumps" },
                            { "language": "de", "text": "ACME Pumpen" }
                        ]
                    },
                    {
                        "modelType": "Property",
                        "idShort": "YearOfConstruction",
                        "valueType": "xs:int",
                        "value": "2019"
                    },
                    {
                        "modelType": "Property",
                        "idShort": "CommissionedOn",
                        "valueType": "xs:date",
                        "value": "2020-03-15"
                    },
                    {
                        "modelType": "Property",
                        "idShort": "SerialCounter",
                        "valueType": "xs:unsignedLong",
                        "value": "18446744073709551615"
                    }
                ]
            },
            {
                "modelType": "Submodel",
                "idShort": "TechnicalData",
                "submodelElements": [
                    {
                        "modelType": "SubmodelElementCollection",
                        "idShort": "Electrical",
                        "value": [
                            {
                                "modelType": "Property",
                                "idShort": "RatedPower",
                                "valueType": "xs:double",
                                "value": "5000.0000005"
                            },
                            {
                                "modelType": "Range",
                                "idShort": "Voltage",
                                "valueType": "xs:double",
                                "min": "380",
                                "max": "420"
                            }
                        ]
                    },
                    {
                        "modelType": "File",
                        "idShort": "Datasheet",
                        "contentType": "application/pdf",
                        "value": "/docs/./pumps/../pumps/0815.pdf"
                    },
                    {
                        "modelType": "Property",
                        "idShort": "ExplosionProof",
                        "valueType": "xs:boolean",
                        "value": "false"
                    },
                    { "modelType": "Operation", "idShort": "Calibrate" }
                ]
            }
        ]
    }))
    .unwrap()
}

fn matches(query: &str, locale: &str) -> bool {
    let document = pump();
    let records = document.element_records();
    parse(query, locale).unwrap().matches(&document, &records)
}

#[test]
fn parsed_queries_match_the_materialized_tree() {
    assert!(matches("CentrifugalPump", "en"));
    assert!(matches("plant.local", "en"));
    assert!(matches("#prop:RatedPower=5000", "en"));
    assert!(!matches("#prop:RatedPower!=5000", "en"));
    assert!(matches("#prop:RatedPower>=4.999,9", "de"));
    assert!(matches("#prop:YearOfConstruction=2015...2020", "en"));
    assert!(matches("#prop:CommissionedOn>=01.03.2020", "de"));
    assert!(matches("#prop:CommissionedOn<04/01/2020", "en"));
    assert!(matches("#prop:SerialCounter=18446744073709551615n", "en"));
    assert!(matches("#mlp:Manufacturer='Pumpen'", "en"));
    assert!(matches("#range:Voltage>=380", "en"));
    assert!(matches("#file:Datasheet='/docs/pumps/0815.pdf'", "en"));
    assert!(matches("#prop:ExplosionProof=false", "en"));
    assert!(!matches("#prop:ExplosionProof=true", "en"));
    assert!(matches("#opr:Calibrate", "en"));
    assert!(matches("#smc:Electrical && #sm:Nameplate", "en"));
}

#[test]
fn boolean_structure_combines_terms() {
    assert!(matches("valve || (pump && #prop:YearOfConstruction<2020)", "en"));
    assert!(!matches("valve || (pump && #prop:YearOfConstruction>2020)", "en"));
    assert!(matches("(#prop:RatedPower<100 || #prop:RatedPower>1000) && CentrifugalPump", "en"));
}

#[test]
fn every_element_is_materialized_once() {
    let document = pump();
    let records = document.element_records();
    assert_eq!(records.len(), 13);
    assert_eq!(
        records.iter().filter(|r| r.kind == ElementKind::Submodel).count(),
        2
    );
    let voltage = records.iter().find(|r| r.id_short == "Voltage").unwrap();
    assert_eq!(voltage.value.as_deref(), Some("380"));
}

#[test]
fn documented_grammar_properties_hold() {
    let expression = parse("A_1 && B_1 || C_1 && D_1", "en").unwrap();
    let sizes: Vec<usize> = expression.groups().iter().map(|g| g.terms.len()).collect();
    assert_eq!(sizes, [2, 2]);

    let inner = parse("A_1 && B_1", "en").unwrap();
    let nested = parse("(A_1 && B_1)", "en").unwrap();
    assert_eq!(nested.groups().len(), 1);
    assert_eq!(nested.groups()[0].terms, vec![Term::Nested(inner)]);

    let err = parse("#prop:x=1...5n", "en").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidRangeExpression);
    assert_eq!(
        parse("A_1 && B_1)", "en").unwrap_err().kind,
        ParseErrorKind::UnexpectedClosingBracket
    );
    assert!(parse("(A_1 && B_1", "en").is_err());
}

#[test]
fn stored_documents_serialize_flat() {
    let stored = StoredDocument::new(pump());
    let value = serde_json::to_value(&stored).unwrap();
    assert_eq!(value["id"], "urn:shell:pump:0815");
    assert_eq!(value["idShort"], "CentrifugalPump");
    assert_eq!(value["revision"].as_str().unwrap().len(), 64);
}
