use anyhow::Result;
use baseball_etl::config::ImportConfig;
use baseball_etl::pipeline::importer::{Importer, TableStatus};
use baseball_etl::query::{self, CannedQuery};
use baseball_etl::report::{self, ReportFilter};
use baseball_etl::storage::{display_value, SqlValue, SqliteStore, TableStore};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_raw_files(raw_dir: &Path) -> Result<()> {
    fs::create_dir_all(raw_dir)?;
    fs::write(
        raw_dir.join("events.csv"),
        "year,event_type,description,value,category\n\
         2023,award,2023 Award Winners,,achievements\n\
         2023,league_leader,Matt Olson - Home Runs,54,statistics\n\
         2023,league_leader,Matt Olson - Home Runs,54,statistics\n\
         1850,award,Too early,,achievements\n\
         not_a_number,award,Unknown year,,achievements\n",
    )?;
    fs::write(
        raw_dir.join("players.csv"),
        "player_name,stat_value,stat_type,team,category,rank\n\
         Barry Bonds,762,career home runs,Career,career_leaders,1.\n\
         ,714,career home runs,Career,career_leaders,2.\n",
    )?;
    fs::write(
        raw_dir.join("statistics.csv"),
        "year,team,category,games_played,wins,losses,league\n\
         2023,Atlanta Braves,team_record,162,104,58,MLB\n\
         2023,Broken Team,team_record,250,104,146,MLB\n",
    )?;
    fs::write(
        raw_dir.join("mvp_awards.csv"),
        "year,player_name,league,team,position,source_url,extraction_date\n\
         1931,Lefty Grove,A.L.,Philadelphia Athletics,P,https://example.com,2024-01-01\n\
         1931,Frankie Frisch,N.L.,St. Louis Cardinals,2B,https://example.com,2024-01-01\n",
    )?;
    fs::write(
        raw_dir.join("baseball_brothers_sets.csv"),
        "set_number,brothers_names\n1,Hank Aaron;Tommie Aaron\n2,Joe DiMaggio;Dom DiMaggio;Vince DiMaggio\n",
    )?;
    Ok(())
}

#[test]
fn test_import_then_query() -> Result<()> {
    let dir = tempdir()?;
    let raw_dir = dir.path().join("raw");
    write_raw_files(&raw_dir)?;
    let config = ImportConfig {
        raw_dir,
        ..ImportConfig::default()
    };

    let mut store = SqliteStore::open(dir.path().join("processed").join("baseball.db"))?;
    let summary = Importer::new(&mut store, &config).run();

    assert!(summary.succeeded());
    let events = summary.report("events").unwrap();
    assert_eq!(events.attempted, 5);
    assert_eq!(events.rejected, 1);
    assert_eq!(events.duplicates, 1);
    assert_eq!(events.loaded, 3);
    assert_eq!(summary.report("players").unwrap().loaded, 1);
    assert_eq!(summary.report("statistics").unwrap().loaded, 1);
    assert_eq!(summary.report("me_awards_list").unwrap().status, TableStatus::Skipped);

    // The unparsable year fell back to 2023
    let events_2023 = CannedQuery::EventsByYear(2023).run(&store)?;
    assert_eq!(events_2023.len(), 3);

    let leagues = store.query("SELECT league FROM mvp_awards ORDER BY player_name", &[])?;
    let leagues: Vec<String> = leagues.column_values("league").map(display_value).collect();
    assert_eq!(leagues, vec!["NL", "AL"]);

    let counts = store.query(
        "SELECT brothers_count FROM baseball_brothers_sets WHERE set_number = ?1",
        &[SqlValue::Integer(2)],
    )?;
    assert_eq!(counts.rows, vec![vec![SqlValue::Integer(3)]]);

    let tables = query::list_tables(&store)?;
    assert_eq!(tables.len(), 5);

    let report = report::load_report(&store, &ReportFilter::default())?;
    assert_eq!(report.total_awards, 2);
    assert_eq!(report.brothers_distribution.len(), 2);
    Ok(())
}

#[test]
fn test_reimport_replaces_previous_rows() -> Result<()> {
    let dir = tempdir()?;
    let raw_dir = dir.path().join("raw");
    write_raw_files(&raw_dir)?;
    let config = ImportConfig {
        raw_dir: raw_dir.clone(),
        ..ImportConfig::default()
    };
    let db_path = dir.path().join("baseball.db");

    {
        let mut store = SqliteStore::open(&db_path)?;
        Importer::new(&mut store, &config).run();
    }
    fs::write(
        raw_dir.join("players.csv"),
        "player_name,stat_value,stat_type,team,category,rank\nPete Rose,4256,career hits,Career,career_leaders,1.\n",
    )?;

    let mut store = SqliteStore::open(&db_path)?;
    let summary = Importer::new(&mut store, &config).run();

    assert!(summary.succeeded());
    let players = store.query("SELECT player_name FROM players", &[])?;
    assert_eq!(players.rows, vec![vec![SqlValue::Text("Pete Rose".into())]]);
    assert_eq!(store.row_count("events")?, 3);
    Ok(())
}

#[test]
fn test_missing_required_source_fails_import() -> Result<()> {
    let dir = tempdir()?;
    let raw_dir = dir.path().join("raw");
    write_raw_files(&raw_dir)?;
    fs::remove_file(raw_dir.join("statistics.csv"))?;
    let config = ImportConfig {
        raw_dir,
        ..ImportConfig::default()
    };

    let mut store = SqliteStore::open_in_memory()?;
    let summary = Importer::new(&mut store, &config).run();

    assert!(!summary.succeeded());
    assert_eq!(summary.report("statistics").unwrap().status, TableStatus::Failed);
    assert_eq!(summary.report("events").unwrap().status, TableStatus::Loaded);
    Ok(())
}
