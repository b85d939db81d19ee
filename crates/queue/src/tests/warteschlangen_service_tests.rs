//! Unit-Tests fuer Beitritt, Entfernen und Neuordnung

use std::sync::Arc;

use redeliste_core::EntryId;
use redeliste_db::models::{
    NeueVeranstaltung, VeranstaltungRecord, VeranstaltungUpdate, VeranstaltungsStatus,
};
use redeliste_db::{EventRepository, QueueRepository, SqliteDb};

use crate::{
    error::QueueError,
    service::WarteschlangenService,
    types::{Wortmeldung, WortmeldungsStatus},
};

async fn test_db() -> Arc<SqliteDb> {
    Arc::new(
        SqliteDb::in_memory()
            .await
            .expect("In-Memory-DB konnte nicht geoeffnet werden"),
    )
}

async fn aktive_veranstaltung(db: &Arc<SqliteDb>) -> VeranstaltungRecord {
    let v = EventRepository::create(
        db.as_ref(),
        NeueVeranstaltung {
            name: "Townhall",
            description: None,
            speak_time: 180,
            host_code: "HOSTCODE",
            share_code: "SHARCODE",
        },
    )
    .await
    .expect("Veranstaltung anlegen fehlgeschlagen");

    EventRepository::update(
        db.as_ref(),
        v.id,
        VeranstaltungUpdate {
            status: Some(VeranstaltungsStatus::Active),
            ..Default::default()
        },
    )
    .await
    .expect("Aktivierung fehlgeschlagen")
}

async fn beitreten<E, Q>(
    service: &WarteschlangenService<E, Q>,
    code: &str,
    name: &str,
) -> Wortmeldung
where
    E: EventRepository,
    Q: QueueRepository,
{
    service
        .beitreten(code, name)
        .await
        .expect("Beitritt fehlgeschlagen")
}

fn positionen(eintraege: &[Wortmeldung]) -> Vec<(String, i64)> {
    eintraege
        .iter()
        .map(|e| (e.participant.clone(), e.position))
        .collect()
}

#[tokio::test]
async fn test_beitritt_vergibt_fortlaufende_positionen() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let ben = beitreten(&service, &v.share_code, "ben").await;
    let clara = beitreten(&service, &v.share_code, "clara").await;

    assert_eq!(anna.position, 1);
    assert_eq!(ben.position, 2);
    assert_eq!(clara.position, 3);
    assert_eq!(anna.status, WortmeldungsStatus::Waiting);
    assert!(anna.started_at.is_none());
    assert_eq!(anna.extended_time, 0);
}

#[tokio::test]
async fn test_beitritt_trimmt_den_namen() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "  anna  ").await;
    assert_eq!(anna.participant, "anna");

    // Nach dem Trimmen zaehlt der Name als belegt
    let nochmal = service.beitreten(&v.share_code, "anna ").await;
    assert!(matches!(nochmal, Err(QueueError::DoppelteWortmeldung(_))));
}

#[tokio::test]
async fn test_ungueltige_namen_abgelehnt() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let leer = service.beitreten(&v.share_code, "   ").await;
    assert!(matches!(leer, Err(QueueError::UngueltigeEingabe(_))));

    let zu_lang = "x".repeat(101);
    let lang = service.beitreten(&v.share_code, &zu_lang).await;
    assert!(matches!(lang, Err(QueueError::UngueltigeEingabe(_))));
}

#[tokio::test]
async fn test_beitritt_mit_unbekanntem_code() {
    let db = test_db().await;
    aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let result = service.beitreten("FALSCH99", "anna").await;
    assert!(matches!(
        result,
        Err(QueueError::VeranstaltungNichtGefunden(_))
    ));
}

#[tokio::test]
async fn test_beitritt_nach_ende_abgelehnt() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    EventRepository::update(
        db.as_ref(),
        v.id,
        VeranstaltungUpdate {
            status: Some(VeranstaltungsStatus::Finished),
            ..Default::default()
        },
    )
    .await
    .expect("Statuswechsel fehlgeschlagen");

    let result = service.beitreten(&v.share_code, "anna").await;
    assert!(matches!(result, Err(QueueError::VeranstaltungBeendet)));
}

#[tokio::test]
async fn test_beitritt_waehrend_der_vorbereitung_erlaubt() {
    let db = test_db().await;
    let v = EventRepository::create(
        db.as_ref(),
        NeueVeranstaltung {
            name: "Townhall",
            description: None,
            speak_time: 180,
            host_code: "HOSTCODE",
            share_code: "SHARCODE",
        },
    )
    .await
    .expect("Veranstaltung anlegen fehlgeschlagen");
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    // Die Liste darf sich schon vor dem Start fuellen
    let anna = beitreten(&service, &v.share_code, "anna").await;
    assert_eq!(anna.position, 1);
}

#[tokio::test]
async fn test_doppelter_beitritt_abgelehnt() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    beitreten(&service, &v.share_code, "anna").await;
    let nochmal = service.beitreten(&v.share_code, "anna").await;
    assert!(matches!(nochmal, Err(QueueError::DoppelteWortmeldung(_))));
}

#[tokio::test]
async fn test_abgeschlossener_teilnehmer_darf_erneut_beitreten() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");
    service
        .abschliessen(&v.host_code, anna.id)
        .await
        .expect("Abschliessen fehlgeschlagen");

    // Nach dem Redebeitrag ist ein erneuter Beitritt erlaubt
    let erneut = beitreten(&service, &v.share_code, "anna").await;
    assert_ne!(erneut.id, anna.id);
    assert_eq!(erneut.position, 2);
}

#[tokio::test]
async fn test_entfernen_schliesst_die_luecke() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    beitreten(&service, &v.share_code, "anna").await;
    let ben = beitreten(&service, &v.share_code, "ben").await;
    beitreten(&service, &v.share_code, "clara").await;
    beitreten(&service, &v.share_code, "doris").await;

    service
        .entfernen(&v.host_code, ben.id)
        .await
        .expect("Entfernen fehlgeschlagen");

    let uebersicht = service
        .uebersicht(&v.share_code)
        .await
        .expect("Uebersicht fehlgeschlagen");
    assert_eq!(
        positionen(&uebersicht.eintraege),
        vec![
            ("anna".to_string(), 1),
            ("clara".to_string(), 2),
            ("doris".to_string(), 3),
        ]
    );
}

#[tokio::test]
async fn test_entfernen_verlangt_host_code() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let result = service.entfernen(&v.share_code, anna.id).await;
    assert!(matches!(result, Err(QueueError::KeineBerechtigung(_))));
}

#[tokio::test]
async fn test_entfernen_unbekannter_eintrag() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let result = service.entfernen(&v.host_code, EntryId::new()).await;
    assert!(matches!(
        result,
        Err(QueueError::WortmeldungNichtGefunden(_))
    ));
}

#[tokio::test]
async fn test_entfernen_ist_endgueltig() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    service
        .entfernen(&v.host_code, anna.id)
        .await
        .expect("Entfernen fehlgeschlagen");

    // Ein entfernter Eintrag ist fuer alle weiteren Aktionen unsichtbar
    let nochmal = service.entfernen(&v.host_code, anna.id).await;
    assert!(matches!(
        nochmal,
        Err(QueueError::WortmeldungNichtGefunden(_))
    ));

    let starten = service.sprecher_starten(&v.host_code, anna.id).await;
    assert!(matches!(
        starten,
        Err(QueueError::WortmeldungNichtGefunden(_))
    ));
}

#[tokio::test]
async fn test_eintrag_fremder_veranstaltung_unsichtbar() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let andere = EventRepository::create(
        db.as_ref(),
        NeueVeranstaltung {
            name: "Zweite Runde",
            description: None,
            speak_time: 120,
            host_code: "HOST2222",
            share_code: "SHAR2222",
        },
    )
    .await
    .expect("Veranstaltung anlegen fehlgeschlagen");
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let fremd = beitreten(&service, &andere.share_code, "anna").await;

    let result = service.entfernen(&v.host_code, fremd.id).await;
    assert!(matches!(
        result,
        Err(QueueError::WortmeldungNichtGefunden(_))
    ));
}

#[tokio::test]
async fn test_neuordnung_round_trip() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let ben = beitreten(&service, &v.share_code, "ben").await;
    let clara = beitreten(&service, &v.share_code, "clara").await;

    let neu = service
        .neu_ordnen(&v.host_code, &[clara.id, anna.id, ben.id])
        .await
        .expect("Neuordnung fehlgeschlagen");

    assert_eq!(
        positionen(&neu),
        vec![
            ("clara".to_string(), 1),
            ("anna".to_string(), 2),
            ("ben".to_string(), 3),
        ]
    );

    // Eine frische Sicht zeigt dieselbe Ordnung
    let uebersicht = service
        .uebersicht(&v.share_code)
        .await
        .expect("Uebersicht fehlgeschlagen");
    assert_eq!(positionen(&uebersicht.eintraege), positionen(&neu));
}

#[tokio::test]
async fn test_neuordnung_mit_unbekannter_id() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    beitreten(&service, &v.share_code, "ben").await;

    let result = service
        .neu_ordnen(&v.host_code, &[EntryId::new(), anna.id])
        .await;
    assert!(matches!(result, Err(QueueError::UnbekannterEintrag(_))));

    // Die alte Ordnung bleibt vollstaendig erhalten
    let uebersicht = service
        .uebersicht(&v.share_code)
        .await
        .expect("Uebersicht fehlgeschlagen");
    assert_eq!(
        positionen(&uebersicht.eintraege),
        vec![("anna".to_string(), 1), ("ben".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_neuordnung_lehnt_nicht_wartende_ids_ab() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let ben = beitreten(&service, &v.share_code, "ben").await;
    service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");

    // Die Zielreihenfolge bestimmt nur die wartenden Eintraege; der
    // aktive Sprecher gehoert nicht hinein
    let result = service.neu_ordnen(&v.host_code, &[anna.id, ben.id]).await;
    assert!(matches!(result, Err(QueueError::UnbekannterEintrag(_))));
}

#[tokio::test]
async fn test_neuordnung_verlangt_vollstaendige_abdeckung() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    beitreten(&service, &v.share_code, "ben").await;

    let teilmenge = service.neu_ordnen(&v.host_code, &[anna.id]).await;
    assert!(matches!(teilmenge, Err(QueueError::UngueltigeEingabe(_))));

    let doppelt = service.neu_ordnen(&v.host_code, &[anna.id, anna.id]).await;
    assert!(matches!(doppelt, Err(QueueError::UngueltigeEingabe(_))));
}

#[tokio::test]
async fn test_neuordnung_schiebt_nicht_wartende_nach_hinten() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let ben = beitreten(&service, &v.share_code, "ben").await;
    let clara = beitreten(&service, &v.share_code, "clara").await;

    service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");

    let neu = service
        .neu_ordnen(&v.host_code, &[clara.id, ben.id])
        .await
        .expect("Neuordnung fehlgeschlagen");

    assert_eq!(
        positionen(&neu),
        vec![
            ("clara".to_string(), 1),
            ("ben".to_string(), 2),
            ("anna".to_string(), 3),
        ]
    );
    assert_eq!(neu[2].status, WortmeldungsStatus::Speaking);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_gleichzeitige_beitritte_kollidieren_nicht() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    for name in ["anna", "ben", "clara", "doris", "emil"] {
        beitreten(&service, &v.share_code, name).await;
    }

    let s1 = service.clone();
    let s2 = service.clone();
    let code1 = v.share_code.clone();
    let code2 = v.share_code.clone();

    let (a, b) = tokio::join!(
        tokio::spawn(async move { s1.beitreten(&code1, "frieda").await }),
        tokio::spawn(async move { s2.beitreten(&code2, "georg").await }),
    );

    let erste = a.expect("Task abgebrochen").expect("Beitritt fehlgeschlagen");
    let zweite = b.expect("Task abgebrochen").expect("Beitritt fehlgeschlagen");

    // Beide Beitritte landen auf verschiedenen, dichten Positionen,
    // keiner sieht das Maximum des anderen
    let mut belegte = vec![erste.position, zweite.position];
    belegte.sort_unstable();
    assert_eq!(belegte, vec![6, 7]);
}

#[tokio::test]
async fn test_uebersicht_zeigt_rolle_und_naechsten() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    beitreten(&service, &v.share_code, "anna").await;
    beitreten(&service, &v.share_code, "ben").await;

    let als_gast = service
        .uebersicht(&v.share_code)
        .await
        .expect("Uebersicht fehlgeschlagen");
    assert!(!als_gast.ist_host);
    assert!(als_gast.sprecher.is_none());
    assert_eq!(
        als_gast.naechster.as_ref().map(|n| n.participant.as_str()),
        Some("anna")
    );

    let als_host = service
        .uebersicht(&v.host_code)
        .await
        .expect("Uebersicht fehlgeschlagen");
    assert!(als_host.ist_host);
    assert_eq!(als_host.eintraege.len(), 2);
}
