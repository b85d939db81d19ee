//! Unit-Tests fuer Sprecher-Uebergaenge und Timer

use std::sync::Arc;

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

#[tokio::test]
async fn test_sprecher_starten_setzt_redebeginn() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let sprechend = service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");

    assert_eq!(sprechend.status, WortmeldungsStatus::Speaking);
    assert!(sprechend.started_at.is_some());
    assert_eq!(sprechend.position, 1);
}

#[tokio::test]
async fn test_sprecher_starten_verlangt_aktive_veranstaltung() {
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

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let result = service.sprecher_starten(&v.host_code, anna.id).await;
    assert!(matches!(
        result,
        Err(QueueError::VeranstaltungNichtAktiv("preparing"))
    ));
}

#[tokio::test]
async fn test_nur_ein_sprecher_gleichzeitig() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let ben = beitreten(&service, &v.share_code, "ben").await;

    service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");

    let zweiter = service.sprecher_starten(&v.host_code, ben.id).await;
    assert!(
        matches!(zweiter, Err(QueueError::SprecherBereitsAktiv(ref wer)) if wer == "anna"),
        "erwartet SprecherBereitsAktiv, war: {zweiter:?}"
    );
}

#[tokio::test]
async fn test_sprecher_starten_nur_aus_wartend() {
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

    let erneut = service.sprecher_starten(&v.host_code, anna.id).await;
    assert!(matches!(
        erneut,
        Err(QueueError::UngueltigerZustand {
            erwartet: "waiting",
            tatsaechlich: "completed"
        })
    ));
}

#[tokio::test]
async fn test_abschliessen_behaelt_redebeginn() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let sprechend = service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");

    let fertig = service
        .abschliessen(&v.host_code, anna.id)
        .await
        .expect("Abschliessen fehlgeschlagen");

    assert_eq!(fertig.status, WortmeldungsStatus::Completed);
    assert_eq!(fertig.started_at, sprechend.started_at);
}

#[tokio::test]
async fn test_abschliessen_nur_waehrend_des_sprechens() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let result = service.abschliessen(&v.host_code, anna.id).await;
    assert!(matches!(
        result,
        Err(QueueError::UngueltigerZustand {
            erwartet: "speaking",
            tatsaechlich: "waiting"
        })
    ));
}

#[tokio::test]
async fn test_verlaengerung_ist_additiv() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");

    let einmal = service
        .verlaengern(&v.host_code, anna.id, 30)
        .await
        .expect("Verlaengern fehlgeschlagen");
    assert_eq!(einmal.extended_time, 30);

    let nochmal = service
        .verlaengern(&v.host_code, anna.id, 15)
        .await
        .expect("Verlaengern fehlgeschlagen");
    assert_eq!(nochmal.extended_time, 45);
}

#[tokio::test]
async fn test_verlaengerung_nur_waehrend_des_sprechens() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;

    let wartend = service.verlaengern(&v.host_code, anna.id, 30).await;
    assert!(matches!(
        wartend,
        Err(QueueError::UngueltigerZustand { .. })
    ));

    service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");

    let null = service.verlaengern(&v.host_code, anna.id, 0).await;
    assert!(matches!(null, Err(QueueError::UngueltigeEingabe(_))));

    let negativ = service.verlaengern(&v.host_code, anna.id, -10).await;
    assert!(matches!(negativ, Err(QueueError::UngueltigeEingabe(_))));
}

#[tokio::test]
async fn test_naechster_sprecher_schliesst_ab_und_befoerdert() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let ben = beitreten(&service, &v.share_code, "ben").await;

    // Erster Aufruf: niemand spricht, anna wird befoerdert
    let erster = service
        .naechster_sprecher(&v.host_code)
        .await
        .expect("Sprecherwechsel fehlgeschlagen");
    assert!(erster.abgeschlossen.is_none());
    assert_eq!(erster.sprechend.as_ref().map(|w| w.id), Some(anna.id));

    // Zweiter Aufruf: anna wird abgeschlossen, ben uebernimmt
    let zweiter = service
        .naechster_sprecher(&v.host_code)
        .await
        .expect("Sprecherwechsel fehlgeschlagen");
    assert_eq!(zweiter.abgeschlossen.as_ref().map(|w| w.id), Some(anna.id));
    assert_eq!(
        zweiter.abgeschlossen.as_ref().map(|w| w.status),
        Some(WortmeldungsStatus::Completed)
    );
    assert_eq!(zweiter.sprechend.as_ref().map(|w| w.id), Some(ben.id));

    // Dritter Aufruf: Liste leer, niemand spricht mehr
    let dritter = service
        .naechster_sprecher(&v.host_code)
        .await
        .expect("Sprecherwechsel fehlgeschlagen");
    assert_eq!(dritter.abgeschlossen.as_ref().map(|w| w.id), Some(ben.id));
    assert!(dritter.sprechend.is_none());

    let timer = service
        .timer(&v.host_code)
        .await
        .expect("Timer fehlgeschlagen");
    assert!(timer.sprecher.is_none());
}

#[tokio::test]
async fn test_naechster_sprecher_bei_leerer_liste() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let result = service
        .naechster_sprecher(&v.host_code)
        .await
        .expect("Sprecherwechsel fehlgeschlagen");
    assert!(result.abgeschlossen.is_none());
    assert!(result.sprechend.is_none());
}

#[tokio::test]
async fn test_wieder_einreihen_setzt_zurueck() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let ben = beitreten(&service, &v.share_code, "ben").await;

    service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");
    service
        .verlaengern(&v.host_code, anna.id, 60)
        .await
        .expect("Verlaengern fehlgeschlagen");
    service
        .abschliessen(&v.host_code, anna.id)
        .await
        .expect("Abschliessen fehlgeschlagen");

    let erneut = service
        .wieder_einreihen(&v.host_code, anna.id)
        .await
        .expect("Wiedereinreihen fehlgeschlagen");

    assert_eq!(erneut.status, WortmeldungsStatus::Waiting);
    assert!(erneut.started_at.is_none());
    assert_eq!(erneut.extended_time, 0);
    assert_eq!(erneut.position, 2);

    // ben rueckt auf die freigewordene Position eins
    let uebersicht = service
        .uebersicht(&v.host_code)
        .await
        .expect("Uebersicht fehlgeschlagen");
    let ben_danach = uebersicht
        .eintraege
        .iter()
        .find(|e| e.id == ben.id)
        .expect("ben fehlt in der Uebersicht");
    assert_eq!(ben_danach.position, 1);
}

#[tokio::test]
async fn test_wieder_einreihen_nur_abgeschlossene() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let result = service.wieder_einreihen(&v.host_code, anna.id).await;
    assert!(matches!(
        result,
        Err(QueueError::UngueltigerZustand {
            erwartet: "completed",
            tatsaechlich: "waiting"
        })
    ));
}

#[tokio::test]
async fn test_timer_stand_des_sprechers() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let leer = service
        .timer(&v.share_code)
        .await
        .expect("Timer fehlgeschlagen");
    assert_eq!(leer.speak_time, 180);
    assert!(leer.sprecher.is_none());
    assert!(leer.naechster.is_none());

    let anna = beitreten(&service, &v.share_code, "anna").await;
    let ben = beitreten(&service, &v.share_code, "ben").await;
    service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");

    let ansicht = service
        .timer(&v.share_code)
        .await
        .expect("Timer fehlgeschlagen");
    let stand = ansicht.sprecher.expect("Sprecher-Stand fehlt");
    assert_eq!(stand.wortmeldung.id, anna.id);
    assert_eq!(stand.timer.total_budget, 180);
    assert!(stand.timer.remaining > 170);
    assert!(stand.timer.is_active);
    assert_eq!(ansicht.naechster.map(|w| w.id), Some(ben.id));

    service
        .verlaengern(&v.host_code, anna.id, 60)
        .await
        .expect("Verlaengern fehlgeschlagen");

    let verlaengert = service
        .timer(&v.share_code)
        .await
        .expect("Timer fehlgeschlagen")
        .sprecher
        .expect("Sprecher-Stand fehlt");
    assert_eq!(verlaengert.timer.total_budget, 240);
}

#[tokio::test]
async fn test_sprecher_aktionen_verlangen_host_code() {
    let db = test_db().await;
    let v = aktive_veranstaltung(&db).await;
    let service = WarteschlangenService::neu(db.clone(), db.clone());

    let anna = beitreten(&service, &v.share_code, "anna").await;

    let starten = service.sprecher_starten(&v.share_code, anna.id).await;
    assert!(matches!(starten, Err(QueueError::KeineBerechtigung(_))));

    let wechsel = service.naechster_sprecher(&v.share_code).await;
    assert!(matches!(wechsel, Err(QueueError::KeineBerechtigung(_))));

    service
        .sprecher_starten(&v.host_code, anna.id)
        .await
        .expect("Sprecher starten fehlgeschlagen");

    let verlaengern = service.verlaengern(&v.share_code, anna.id, 30).await;
    assert!(matches!(
        verlaengern,
        Err(QueueError::KeineBerechtigung(_))
    ));

    let abschliessen = service.abschliessen(&v.share_code, anna.id).await;
    assert!(matches!(
        abschliessen,
        Err(QueueError::KeineBerechtigung(_))
    ));
}
