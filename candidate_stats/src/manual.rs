/*!

This is the long-form manual for `candidate_stats` and `candash`.

## Input formats

The following formats are supported:
* `excel` Spreadsheets (`.xlsx`, `.xls`, `.xlsb`, `.ods`)
* `csv` Comma Separated Values with a header row

In both cases, the first row holds the names of the columns. The whitespaces around
the names are removed, and the names must be unique after this step.

### `excel`

The first worksheet is used, unless a worksheet name is given with `--excel-worksheet-name`
or with `excelWorksheetName` in the configuration file. The type of each cell is the one
stored in the spreadsheet.

### `csv`

The type of each cell is inferred from its content: empty, integer, decimal number,
boolean or text.

```text
Candidate,Party,Gender,District,Constituency,Cases Total,Total Assets,Age,Education
Alice,AAP,F,New Delhi,Chandni Chowk,0,1500000,45,Graduate
Bob,BJP,M,North East,Seelampur,2,8200000,52,12th Pass
```

## Expected columns

The dashboard expects the columns `Party`, `Gender`, `District`, `Constituency`,
`Candidate`, `Cases Total`, `Total Assets`, `Age` and `Education`. Other columns are
kept and shown in the hover information of the violin plot.

`Party`, `Gender` and `District` are required: the data cannot be filtered without them.
If another column is missing, only the charts that need it are replaced by an error message.

## Configuration

`candash` comes with sensible defaults. Users may provide a configuration file in JSON:

```json
{
  "outputSettings": {
    "title": "Delhi Assembly 2025 Candidate Dashboard",
    "outputPath": "dashboard.html",
    "summaryPath": "summary.json",
    "serveAddress": "127.0.0.1:8501"
  },
  "dataSource": {
    "provider": "excel",
    "filePath": "data/Delhi Assembly 2025 Candidates Data.xls"
  },
  "filters": {
    "party": ["AAP", "BJP"]
  }
}
```

All the fields are optional. A relative `filePath` is read from the directory of the
configuration file. The command line options take precedence over the configuration file.

The filters select the values to keep for each dimension. A dimension that is not
specified keeps all the values observed in the data. A dimension set to an empty
list keeps nothing.

## Serving the dashboard

With `--serve` (or `serveAddress`), `candash` serves the page on a local address, by
default `127.0.0.1:8501`. Changing a filter widget on the page sends the new selection
to `POST /filter`, which applies it and returns the redrawn panels. `GET /summary`
returns the summary of the current selection. When serving, no page is written unless
an output path is given. A written page is a snapshot: its widgets show the selection
but cannot change it.

 */
